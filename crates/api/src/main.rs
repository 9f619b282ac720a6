use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wpcauth_observability::init();

    let config = wpcauth_api::config::GatewayConfig::load().context("failed to load gateway configuration")?;
    let bind_addr = config.bind_addr.clone();

    let app = wpcauth_api::app::build_app(config).context("failed to build gateway")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

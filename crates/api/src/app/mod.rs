//! HTTP application wiring.
//!
//! - `routes/`: handlers, one file per REST namespace
//! - `errors.rs`: WordPress-style error bodies

use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Router};
use tower::ServiceBuilder;

use wpcauth_auth::PolicyConfig;
use wpcauth_core::RoutePath;

use crate::config::{ConfigError, GatewayConfig};
use crate::credentials::{CredentialLayer, JwtCredentials};
use crate::directory::InMemoryUserDirectory;
use crate::middleware;

pub mod errors;
pub mod routes;

/// Shared, read-only state for middleware and handlers.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<PolicyConfig>,
    /// `None` when no signing key is configured.
    pub credentials: Option<Arc<dyn CredentialLayer>>,
    /// Used when there is no credential layer to ask.
    pub authorization_required: StatusCode,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let authorization_required = StatusCode::from_u16(config.authorization_required_status)
            .map_err(|_| ConfigError::InvalidStatus(config.authorization_required_status))?;

        let policy = PolicyConfig::from_settings(&config.policy)?;
        let directory = InMemoryUserDirectory::from_records(&config.users, &config.role_capabilities)?;
        tracing::info!(users = directory.len(), "user directory loaded");

        let credentials = config.jwt_secret.as_ref().map(|secret| {
            Arc::new(JwtCredentials::new(
                secret,
                config.issuer.clone(),
                Arc::new(directory),
                authorization_required,
            )) as Arc<dyn CredentialLayer>
        });

        Ok(Self {
            policy: Arc::new(policy),
            credentials,
            authorization_required,
        })
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: GatewayConfig) -> Result<Router, ConfigError> {
    let state = AppState::from_config(&config)?;
    Ok(router(state))
}

/// Router over an already assembled state.
pub fn router(state: AppState) -> Router {
    let prefix = RoutePath::new(state.policy.routes.api_prefix());

    let rest = if prefix.is_root() {
        routes::router()
    } else {
        Router::new().nest(prefix.as_str(), routes::router())
    };

    // Everything except /health is REST surface: gated, then decorated.
    let rest = rest
        .fallback(routes::system::no_route)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::response_headers,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::access_middleware,
                )),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(rest)
        .layer(axum::middleware::from_fn(middleware::request_span))
}

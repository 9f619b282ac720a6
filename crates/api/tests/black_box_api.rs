use std::collections::BTreeMap;

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::StatusCode;
use serde_json::{json, Value};

use wpcauth_api::config::GatewayConfig;
use wpcauth_api::directory::UserRecord;
use wpcauth_auth::{Role, SharedSecret, TokenClaims, TokenWindow, UserData};
use wpcauth_core::UserId;

const JWT_SECRET: &str = "test-secret";
const ISSUER: &str = "https://wpcampus.org";
const ADMIN_ID: u64 = 7;
const SUBSCRIBER_ID: u64 = 8;
const PASSWORD: &str = "correct horse battery staple";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(config: GatewayConfig) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = wpcauth_api::app::build_app(config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn rest(&self, route: &str) -> String {
        format!("{}/wp-json{}", self.base_url, route)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn user(id: u64, login: &str, role: &'static str) -> UserRecord {
    let salt = SaltString::encode_b64(b"black-box-salt!!").unwrap();
    let mut profile = UserData::new(UserId::new(id), login);
    profile.user_email = format!("{login}@wpcampus.org");
    profile.user_pass = Argon2::default()
        .hash_password(PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string();
    UserRecord {
        profile,
        roles: vec![Role::new(role)],
        caps: BTreeMap::new(),
    }
}

fn config() -> GatewayConfig {
    GatewayConfig {
        issuer: ISSUER.to_string(),
        jwt_secret: Some(SharedSecret::new(JWT_SECRET)),
        users: vec![user(ADMIN_ID, "jane", "administrator"), user(SUBSCRIBER_ID, "sam", "subscriber")],
        ..GatewayConfig::default()
    }
}

fn mint_jwt(user_id: u64) -> String {
    let now = Utc::now().timestamp();
    let claims = TokenClaims::new(ISSUER, UserId::new(user_id), now, now + 600);

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token_lifetime(token: &str) -> i64 {
    let data = jsonwebtoken::decode::<Value>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .expect("issued token should verify");
    data.claims["exp"].as_i64().unwrap() - data.claims["iat"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_outside_the_gate() {
    let srv = TestServer::spawn(GatewayConfig::default()).await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn public_routes_pass_the_gate_anonymously() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::get(srv.rest("/wp/v2/posts")).await.unwrap();

    // Past the gate, nothing serves the route.
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "rest_no_route");
}

#[tokio::test]
async fn private_routes_require_login_and_keep_cors_headers() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::get(srv.rest("/wpcampus/data/private/report")).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET");
    assert_eq!(headers["access-control-allow-headers"], "Accept, Authorization, Content-Type");
    assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate, max-age=0");
    assert!(headers.get_all("vary").iter().any(|v| v == "Origin"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_rest_login_required");
    assert_eq!(body["message"], "Only authenticated users can access this route.");
    assert_eq!(body["data"]["status"], 401);
}

#[tokio::test]
async fn plain_permalink_requests_are_gated_too() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::get(format!(
        "{}/?rest_route=/wpcampus/data/private/report",
        srv.base_url
    ))
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn capability_decides_private_access() {
    let srv = TestServer::spawn(config()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.rest("/wpcampus/data/private/report"))
        .bearer_auth(mint_jwt(ADMIN_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Logged in but lacking manage_options.
    let res = client
        .get(srv.rest("/wpcampus/data/private/report"))
        .bearer_auth(mint_jwt(SUBSCRIBER_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_rest_login_required");
}

#[tokio::test]
async fn denial_is_attached_to_a_rejected_token() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::Client::new()
        .get(srv.rest("/wpcampus/data/private/report"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "jwt_auth_invalid_token");
    assert_eq!(body["additional_errors"][0]["code"], "wpcampus_auth_rest_login_required");
}

#[tokio::test]
async fn current_user_is_projected_without_secrets() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::Client::new()
        .get(srv.rest("/wpcampus/auth/user"))
        .bearer_auth(mint_jwt(ADMIN_ID))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ID"], ADMIN_ID);
    assert_eq!(body["user_login"], "jane");
    assert_eq!(body["user_email"], "jane@wpcampus.org");
    assert_eq!(body["roles"], json!(["administrator"]));
    assert_eq!(body["caps"]["manage_options"], true);
    for redacted in ["user_pass", "user_nicename", "user_activation_key", "user_status", "spam", "deleted"] {
        assert!(body.get(redacted).is_none(), "{redacted} leaked");
    }
}

#[tokio::test]
async fn current_user_requires_authorization() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::get(srv.rest("/wpcampus/auth/user")).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_not_logged_in");
}

#[tokio::test]
async fn current_user_without_credential_layer_is_a_server_error() {
    let srv = TestServer::spawn(GatewayConfig {
        jwt_secret: None,
        ..config()
    })
    .await;

    let res = reqwest::get(srv.rest("/wpcampus/auth/user")).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_upstream_unavailable");
}

#[tokio::test]
async fn token_issuance_uses_the_configured_window() {
    let client = reqwest::Client::new();

    let srv = TestServer::spawn(config()).await;
    let res = client
        .post(srv.rest("/jwt-auth/v1/token"))
        .json(&json!({ "username": "jane", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["roles"], json!(["administrator"]));
    assert!(body["user"].get("user_pass").is_none());
    assert_eq!(token_lifetime(body["token"].as_str().unwrap()), 604_800);

    let mut browser = config();
    browser.policy.token_window = TokenWindow::BrowserApp;
    let srv = TestServer::spawn(browser).await;
    let body: Value = client
        .post(srv.rest("/jwt-auth/v1/token"))
        .json(&json!({ "username": "jane", "password": PASSWORD }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(token_lifetime(body["token"].as_str().unwrap()), 172_800);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::Client::new()
        .post(srv.rest("/jwt-auth/v1/token"))
        .json(&json!({ "username": "jane", "password": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "jwt_auth_failed");
}

#[tokio::test]
async fn secret_gate_withholds_tokens() {
    let mut gated = config();
    gated.policy.shared_secret = Some(SharedSecret::new("campus-secret"));
    let srv = TestServer::spawn(gated).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.rest("/jwt-auth/v1/token"))
        .json(&json!({ "username": "jane", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["access-control-allow-headers"],
        "Accept, Authorization, Content-Type, WPC-Auth-Secret-Key"
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({}));

    let body: Value = client
        .post(srv.rest("/jwt-auth/v1/token"))
        .header("WPC-Auth-Secret-Key", "campus-secret")
        .json(&json!({ "username": "jane", "password": PASSWORD }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn token_validation_endpoint() {
    let srv = TestServer::spawn(config()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.rest("/jwt-auth/v1/token/validate"))
        .bearer_auth(mint_jwt(SUBSCRIBER_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "jwt_auth_valid_token");

    let res = client.post(srv.rest("/jwt-auth/v1/token/validate")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn preflight_skips_the_gate() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, srv.rest("/wpcampus/data/private/report"))
        .header("Origin", "https://2019.wpcampus.org")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn secret_gated_cors_only_opens_token_and_user_routes() {
    let mut gated = config();
    gated.policy.cors_mode = "secret_gated".parse().unwrap();
    let srv = TestServer::spawn(gated).await;

    let res = reqwest::get(srv.rest("/wp/v2/posts")).await.unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_none());

    let res = reqwest::get(srv.rest("/wpcampus/auth/user")).await.unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn rest_route_query_cannot_reroute_a_pretty_path() {
    let srv = TestServer::spawn(config()).await;

    let res = reqwest::get(format!(
        "{}?rest_route=/wp/v2/posts",
        srv.rest("/wpcampus/data/private/report")
    ))
    .await
    .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_rest_login_required");
}

#[tokio::test]
async fn secret_gate_also_guards_current_user() {
    let mut gated = config();
    gated.policy.shared_secret = Some(SharedSecret::new("campus"));
    let srv = TestServer::spawn(gated).await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.rest("/wpcampus/auth/user"))
        .bearer_auth(mint_jwt(ADMIN_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_forbidden");
    assert!(body.get("user_login").is_none());

    let res = client
        .get(srv.rest("/wpcampus/auth/user"))
        .bearer_auth(mint_jwt(ADMIN_ID))
        .header("WPC-Auth-Secret-Key", "campus")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user_login"], "jane");
}

#[tokio::test]
async fn trailing_slash_reaches_the_same_handlers() {
    let srv = TestServer::spawn(config()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.rest("/wpcampus/auth/user/"))
        .bearer_auth(mint_jwt(ADMIN_ID))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ID"], ADMIN_ID);

    let res = client
        .post(srv.rest("/jwt-auth/v1/token/"))
        .json(&json!({ "username": "jane", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_issuance_without_credential_layer_is_a_server_error() {
    let srv = TestServer::spawn(GatewayConfig {
        jwt_secret: None,
        ..config()
    })
    .await;

    let res = reqwest::Client::new()
        .post(srv.rest("/jwt-auth/v1/token"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "wpcampus_auth_upstream_unavailable");
}

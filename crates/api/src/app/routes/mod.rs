use axum::{
    routing::{get, post},
    Router,
};

use wpcauth_auth::{CURRENT_USER_ROUTE, TOKEN_ROUTE, TOKEN_VALIDATE_ROUTE};

use crate::app::AppState;

pub mod auth;
pub mod system;
pub mod token;

/// REST endpoints, relative to the API prefix. Each route also answers
/// with a trailing slash, as the access gate treats both forms alike.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(CURRENT_USER_ROUTE, get(auth::current_user))
        .route(&with_trailing_slash(CURRENT_USER_ROUTE), get(auth::current_user))
        .route(TOKEN_ROUTE, post(token::issue))
        .route(&with_trailing_slash(TOKEN_ROUTE), post(token::issue))
        .route(TOKEN_VALIDATE_ROUTE, post(token::validate))
        .route(&with_trailing_slash(TOKEN_VALIDATE_ROUTE), post(token::validate))
}

fn with_trailing_slash(route: &str) -> String {
    format!("{route}/")
}

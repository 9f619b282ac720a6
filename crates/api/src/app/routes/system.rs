use axum::{
    extract::Extension,
    http::{StatusCode, Uri},
};

use crate::app::errors::ApiError;
use crate::context::RequestRoute;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Reached only after the access gate let the request through.
pub async fn no_route(route: Option<Extension<RequestRoute>>, uri: Uri) -> ApiError {
    let route = match route {
        Some(Extension(route)) => route.route().to_string(),
        None => uri.path().to_string(),
    };
    tracing::debug!(%route, "no handler for route");
    ApiError::NoRoute(route)
}

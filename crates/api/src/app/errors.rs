use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{json, Value};
use thiserror::Error;

use wpcauth_auth::{AuthFailure, FailureCause};

pub const NO_ROUTE_CODE: &str = "rest_no_route";
pub const BAD_REQUEST_CODE: &str = "rest_invalid_json";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("no route matches {0}")]
    NoRoute(String),

    #[error("invalid request body: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Auth(failure) => failure_response(&failure),
            ApiError::NoRoute(_) => json_error(
                StatusCode::NOT_FOUND,
                NO_ROUTE_CODE,
                "No route was found matching the URL and request method.",
            ),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, BAD_REQUEST_CODE, msg),
        }
    }
}

/// `{code, message, data: {status}}`, with any further causes listed under
/// `additional_errors`. The first cause decides the status.
pub fn failure_response(failure: &AuthFailure) -> axum::response::Response {
    let status = StatusCode::from_u16(failure.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut body = cause_body(failure.primary());
    if !failure.additional().is_empty() {
        body["additional_errors"] = failure.additional().iter().map(cause_body).collect();
    }
    (status, axum::Json(body)).into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    let cause = FailureCause::new(code, message, status.as_u16());
    (status, axum::Json(cause_body(&cause))).into_response()
}

fn cause_body(cause: &FailureCause) -> Value {
    json!({
        "code": cause.code,
        "message": cause.message,
        "data": { "status": cause.status },
    })
}

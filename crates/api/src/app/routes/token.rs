use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use wpcauth_auth::{AuthError, AuthFailure, FailureCause, TokenResponsePayload};

use crate::app::errors::ApiError;
use crate::app::AppState;
use crate::context::CurrentUser;

pub const VALID_TOKEN_CODE: &str = "jwt_auth_valid_token";
pub const NO_AUTH_HEADER_CODE: &str = "jwt_auth_no_auth_header";

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// `POST /jwt-auth/v1/token`
pub async fn issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponsePayload>, ApiError> {
    let layer = active_layer(&state)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let hooks = &state.policy.tokens;
    let gate_header = hooks
        .secret_gate()
        .and_then(|gate| headers.get(gate.header_name()))
        .and_then(|value| value.to_str().ok());

    let payload = layer
        .issue(&request.username, &request.password, hooks, gate_header)
        .await?;
    Ok(Json(payload))
}

/// `POST /jwt-auth/v1/token/validate`: the access middleware already
/// rejected bad tokens, so reaching here with a user means the token is good.
pub async fn validate(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<Value>, ApiError> {
    active_layer(&state)?;

    if user.is_none() {
        return Err(AuthFailure::new(FailureCause::new(
            NO_AUTH_HEADER_CODE,
            "Authorization header not found.",
            403,
        ))
        .into());
    }

    Ok(Json(json!({
        "code": VALID_TOKEN_CODE,
        "data": { "status": 200 },
    })))
}

fn active_layer(state: &AppState) -> Result<&dyn crate::credentials::CredentialLayer, ApiError> {
    match &state.credentials {
        Some(layer) => Ok(layer.as_ref()),
        None => {
            tracing::error!("token endpoint called but the credential layer is not active");
            Err(AuthError::UpstreamUnavailable("the credential layer is not active".into())
                .into_failure(state.authorization_required.as_u16())
                .into())
        }
    }
}

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};

use wpcauth_auth::{AuthError, ProjectedUser};

use crate::app::errors::ApiError;
use crate::app::AppState;
use crate::context::CurrentUser;

/// `GET /wpcampus/auth/user`: the authenticated caller, redacted.
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<ProjectedUser>, ApiError> {
    let Some(layer) = &state.credentials else {
        tracing::error!("current user requested but the credential layer is not active");
        return Err(AuthError::UpstreamUnavailable("the credential layer is not active".into())
            .into_failure(state.authorization_required.as_u16())
            .into());
    };

    // The shared secret guards user lookup as well as token issuance.
    if let Some(gate) = state.policy.tokens.secret_gate() {
        let presented = headers.get(gate.header_name()).and_then(|v| v.to_str().ok());
        if !gate.admits(presented) {
            tracing::info!(header = gate.header_name(), "current user withheld: shared secret missing or wrong");
            let status = layer.authorization_required_code(user.is_some()).as_u16();
            return Err(AuthError::Unauthorized("the shared secret is missing or wrong".into())
                .into_failure(status)
                .into());
        }
    }

    let Some(Extension(user)) = user else {
        return Err(AuthError::Unauthenticated
            .into_failure(layer.authorization_required_code(false).as_u16())
            .into());
    };

    let identity = user.identity();
    if let Err(err) = identity.validate() {
        tracing::warn!(user_id = %identity.id(), error = %err, "resolved identity is unusable");
        return Err(err.into_failure(layer.authorization_required_code(true).as_u16()).into());
    }

    Ok(Json(state.policy.projector.project(identity)))
}

//! Credential layer: bearer-token verification and token issuance (HS256).
//!
//! Signing and verification live here so the policy crate never sees key
//! material. Issuance calls back into [`TokenHooks`] for the token's expiry
//! and for the response body.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use wpcauth_auth::{
    validate_claims, AuthError, AuthFailure, FailureCause, Identity, SharedSecret, TokenClaims, TokenHooks,
    TokenIssuanceResult, TokenResponsePayload, STANDARD_WINDOW_SECS,
};

use crate::directory::UserDirectory;

pub const INVALID_TOKEN_CODE: &str = "jwt_auth_invalid_token";
pub const BAD_AUTH_HEADER_CODE: &str = "jwt_auth_bad_auth_header";
pub const LOGIN_FAILED_CODE: &str = "jwt_auth_failed";
pub const SIGNING_FAILED_CODE: &str = "jwt_auth_signing_failed";

#[async_trait]
pub trait CredentialLayer: Send + Sync {
    /// Resolve a bearer token into the identity it was issued for.
    async fn authenticate(&self, token: &str) -> Result<Identity, AuthFailure>;

    /// Check a login/password pair and issue a token for it.
    async fn issue(
        &self,
        login: &str,
        password: &str,
        hooks: &dyn TokenHooks,
        gate_header: Option<&str>,
    ) -> Result<TokenResponsePayload, AuthFailure>;

    /// Status meaning "authorization required" for the current caller.
    fn authorization_required_code(&self, has_identity: bool) -> StatusCode;
}

pub struct JwtCredentials {
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    directory: Arc<dyn UserDirectory>,
    authorization_required: StatusCode,
}

impl JwtCredentials {
    pub fn new(
        secret: &SharedSecret,
        issuer: impl Into<String>,
        directory: Arc<dyn UserDirectory>,
        authorization_required: StatusCode,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            encoding: EncodingKey::from_secret(secret.expose()),
            decoding: DecodingKey::from_secret(secret.expose()),
            directory,
            authorization_required,
        }
    }

    fn validation() -> Validation {
        // Time window and issuer are checked by `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation
    }

    fn invalid_token(message: impl Into<String>) -> AuthFailure {
        AuthFailure::new(FailureCause::new(
            INVALID_TOKEN_CODE,
            message,
            StatusCode::FORBIDDEN.as_u16(),
        ))
    }
}

#[async_trait]
impl CredentialLayer for JwtCredentials {
    async fn authenticate(&self, token: &str) -> Result<Identity, AuthFailure> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| Self::invalid_token(e.to_string()))?;

        validate_claims(&data.claims, &self.issuer, Utc::now().timestamp())
            .map_err(|e| Self::invalid_token(e.to_string()))?;

        let user_id = data.claims.user_id();
        match self.directory.find_by_id(user_id).await {
            Some(identity) => Ok(identity),
            None => {
                tracing::warn!(%user_id, "token names a user that no longer exists");
                Err(AuthError::InvalidIdentity(format!("user {user_id} not found"))
                    .into_failure(self.authorization_required.as_u16()))
            }
        }
    }

    async fn issue(
        &self,
        login: &str,
        password: &str,
        hooks: &dyn TokenHooks,
        gate_header: Option<&str>,
    ) -> Result<TokenResponsePayload, AuthFailure> {
        let Some(identity) = self.directory.verify_login(login, password).await else {
            tracing::info!(login, "login rejected");
            return Err(AuthFailure::new(FailureCause::new(
                LOGIN_FAILED_CODE,
                "Unknown username or incorrect password.",
                StatusCode::FORBIDDEN.as_u16(),
            )));
        };

        if let Err(err) = identity.validate() {
            tracing::warn!(user_id = %identity.id(), error = %err, "refusing to issue a token for an unusable identity");
            return Err(err.into_failure(self.authorization_required.as_u16()));
        }

        let issued_at = Utc::now().timestamp();
        let expires_at = hooks.expiration(issued_at + STANDARD_WINDOW_SECS, issued_at);
        let claims = TokenClaims::new(self.issuer.clone(), identity.id(), issued_at, expires_at);

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            AuthFailure::new(FailureCause::new(
                SIGNING_FAILED_CODE,
                "The token could not be signed.",
                StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ))
        })?;

        tracing::info!(user_id = %identity.id(), expires_at, "token issued");
        Ok(hooks.before_dispatch(TokenIssuanceResult { token, identity }, gate_header))
    }

    fn authorization_required_code(&self, has_identity: bool) -> StatusCode {
        if has_identity {
            StatusCode::FORBIDDEN
        } else {
            self.authorization_required
        }
    }
}

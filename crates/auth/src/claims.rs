use serde::{Deserialize, Serialize};
use thiserror::Error;

use wpcauth_core::UserId;

/// Bearer token claims (transport-agnostic).
///
/// This is the minimal set of claims the gateway expects once a token has been
/// decoded/verified by the credential layer. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer (site URL).
    pub iss: String,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Not-before timestamp.
    pub nbf: i64,

    /// Expiration timestamp.
    pub exp: i64,

    pub data: ClaimsData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsData {
    pub user: ClaimsUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: UserId,
}

impl TokenClaims {
    pub fn new(issuer: impl Into<String>, user_id: UserId, issued_at: i64, expires_at: i64) -> Self {
        Self {
            iss: issuer.into(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
            data: ClaimsData {
                user: ClaimsUser { id: user_id },
            },
        }
    }

    pub fn user_id(&self) -> UserId {
        self.data.user.id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (nbf is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token was issued by '{0}'")]
    WrongIssuer(String),

    #[error("token does not name a user")]
    MissingUser,
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding is
/// the credential layer's job.
pub fn validate_claims(claims: &TokenClaims, issuer: &str, now: i64) -> Result<(), TokenValidationError> {
    if claims.iss != issuer {
        return Err(TokenValidationError::WrongIssuer(claims.iss.clone()));
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.nbf {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    if claims.user_id().is_anonymous() {
        return Err(TokenValidationError::MissingUser);
    }
    Ok(())
}

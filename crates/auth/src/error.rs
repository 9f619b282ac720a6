//! Authentication/authorization error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status used when a required collaborator is missing (configuration fault).
pub const UPSTREAM_UNAVAILABLE_STATUS: u16 = 500;

/// Status used when the resolved principal is unusable.
pub const INVALID_IDENTITY_STATUS: u16 = 500;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No credential was presented.
    Unauthenticated,
    /// A credential was presented but does not grant access.
    Unauthorized,
    /// A required collaborator (e.g. the credential layer) is not active.
    UpstreamUnavailable,
    /// The resolved principal lacks required fields.
    InvalidIdentity,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization is required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Unauthorized(String),

    #[error("required collaborator is unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Unauthenticated => ErrorKind::Unauthenticated,
            AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            AuthError::InvalidIdentity(_) => ErrorKind::InvalidIdentity,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "wpcampus_auth_not_logged_in",
            AuthError::Unauthorized(_) => "wpcampus_auth_forbidden",
            AuthError::UpstreamUnavailable(_) => "wpcampus_auth_upstream_unavailable",
            AuthError::InvalidIdentity(_) => "wpcampus_auth_invalid_user",
        }
    }

    /// HTTP status for this error.
    ///
    /// `authorization_required` is the credential layer's own "authorization
    /// required" code; client-side failures use it, configuration faults do not.
    pub fn status(&self, authorization_required: u16) -> u16 {
        match self {
            AuthError::Unauthenticated | AuthError::Unauthorized(_) => authorization_required,
            AuthError::UpstreamUnavailable(_) => UPSTREAM_UNAVAILABLE_STATUS,
            AuthError::InvalidIdentity(_) => INVALID_IDENTITY_STATUS,
        }
    }

    pub fn into_failure(self, authorization_required: u16) -> AuthFailure {
        let status = self.status(authorization_required);
        AuthFailure::new(FailureCause::new(self.code(), self.to_string(), status))
    }
}

/// One reason a request failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl FailureCause {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }
}

/// Accumulating request failure.
///
/// Several layers may reject the same request (a malformed token upstream and
/// the route policy downstream). Later layers [`add`](AuthFailure::add) their
/// cause instead of replacing the existing one; the first cause decides the
/// response status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    primary: FailureCause,
    additional: Vec<FailureCause>,
}

impl AuthFailure {
    pub fn new(cause: FailureCause) -> Self {
        Self {
            primary: cause,
            additional: Vec::new(),
        }
    }

    pub fn add(&mut self, cause: FailureCause) {
        self.additional.push(cause);
    }

    pub fn primary(&self) -> &FailureCause {
        &self.primary
    }

    pub fn additional(&self) -> &[FailureCause] {
        &self.additional
    }

    pub fn causes(&self) -> impl Iterator<Item = &FailureCause> {
        core::iter::once(&self.primary).chain(self.additional.iter())
    }

    pub fn status(&self) -> u16 {
        self.primary.status
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.causes().any(|c| c.code == code)
    }
}

impl core::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.primary.code, self.primary.message)?;
        if !self.additional.is_empty() {
            write!(f, " (+{} more)", self.additional.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthFailure {}

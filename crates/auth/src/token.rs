//! Token lifetime and token-issuance response enrichment.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Identity, ProjectedUser, SecretGate, UserProjector};

/// 48 hours; suited to browser apps that re-authenticate often.
pub const BROWSER_APP_WINDOW_SECS: i64 = 2 * 24 * 60 * 60;

/// 7 days.
pub const STANDARD_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Token lifetime used when a deployment does not choose one.
pub const DEFAULT_TOKEN_WINDOW: TokenWindow = TokenWindow::Standard;

/// How long an issued token stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenWindow {
    BrowserApp,
    #[default]
    Standard,
}

impl TokenWindow {
    pub fn seconds(self) -> i64 {
        match self {
            TokenWindow::BrowserApp => BROWSER_APP_WINDOW_SECS,
            TokenWindow::Standard => STANDARD_WINDOW_SECS,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds())
    }
}

impl core::str::FromStr for TokenWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser_app" | "48h" => Ok(TokenWindow::BrowserApp),
            "standard" | "7d" => Ok(TokenWindow::Standard),
            other => Err(format!("unknown token window '{other}' (expected 48h or 7d)")),
        }
    }
}

/// Raw output of the token issuer, consumed once.
#[derive(Debug, Clone)]
pub struct TokenIssuanceResult {
    pub token: String,
    pub identity: Identity,
}

/// Body returned to the client after token issuance.
///
/// Serializes to `{}` when the token was withheld.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResponsePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ProjectedUser>,
}

impl TokenResponsePayload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Callbacks the credential layer invokes while issuing a token.
pub trait TokenHooks: Send + Sync {
    /// Final payload for a freshly issued token.
    ///
    /// `gate_header` is the value of the shared-secret header on the issuing
    /// request, if any.
    fn before_dispatch(&self, raw: TokenIssuanceResult, gate_header: Option<&str>) -> TokenResponsePayload;

    /// Expiry (unix seconds) for a token issued at `issued_at`.
    fn expiration(&self, default_expiration: i64, issued_at: i64) -> i64;
}

#[derive(Debug, Clone)]
pub struct TokenPolicy {
    window: TokenWindow,
    secret_gate: Option<SecretGate>,
    projector: UserProjector,
}

impl TokenPolicy {
    pub fn new(window: TokenWindow, projector: UserProjector) -> Self {
        Self {
            window,
            secret_gate: None,
            projector,
        }
    }

    pub fn with_secret_gate(mut self, gate: SecretGate) -> Self {
        self.secret_gate = Some(gate);
        self
    }

    pub fn window(&self) -> TokenWindow {
        self.window
    }

    pub fn secret_gate(&self) -> Option<&SecretGate> {
        self.secret_gate.as_ref()
    }

    pub fn expiry_timestamp(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(self.window.seconds())
    }

    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.window.duration()
    }

    /// Decide what the client receives for a freshly issued token.
    ///
    /// With a secret gate configured, callers that do not present the exact
    /// shared secret get an empty payload even though their credentials
    /// were accepted.
    pub fn on_token_issued(&self, raw: TokenIssuanceResult, gate_header: Option<&str>) -> TokenResponsePayload {
        if let Some(gate) = &self.secret_gate {
            if !gate.admits(gate_header) {
                tracing::info!(
                    user_id = %raw.identity.id(),
                    header = gate.header_name(),
                    "token withheld: shared secret missing or wrong"
                );
                return TokenResponsePayload::empty();
            }
        }

        let user = self.projector.project(&raw.identity);
        tracing::debug!(user_id = %raw.identity.id(), "token issued");
        TokenResponsePayload {
            token: Some(raw.token),
            user: Some(user),
        }
    }
}

impl TokenHooks for TokenPolicy {
    fn before_dispatch(&self, raw: TokenIssuanceResult, gate_header: Option<&str>) -> TokenResponsePayload {
        self.on_token_issued(raw, gate_header)
    }

    fn expiration(&self, _default_expiration: i64, issued_at: i64) -> i64 {
        self.expiry_timestamp(issued_at)
    }
}

//! Gateway configuration: optional JSON file, then environment overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use wpcauth_auth::{PolicyError, PolicySettings, RoleCapabilities, SharedSecret};

use crate::directory::UserRecord;

/// Path of the JSON configuration file.
pub const CONFIG_PATH_VAR: &str = "WPC_AUTH_CONFIG";
pub const BIND_VAR: &str = "WPC_AUTH_BIND";
pub const JWT_SECRET_VAR: &str = "JWT_AUTH_SECRET_KEY";
pub const SHARED_SECRET_VAR: &str = "WPC_AUTH_SECRET_KEY";
pub const CORS_MODE_VAR: &str = "WPC_AUTH_CORS_MODE";
pub const TOKEN_WINDOW_VAR: &str = "WPC_AUTH_TOKEN_WINDOW";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {message}")]
    InvalidEnv { var: &'static str, message: String },

    #[error("authorization_required_status must be a 4xx status, got {0}")]
    InvalidStatus(u16),

    #[error("duplicate user: {0}")]
    DuplicateUser(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub bind_addr: String,

    /// `iss` claim of issued tokens.
    pub issuer: String,

    /// HS256 signing key. Without it the credential layer is inactive.
    pub jwt_secret: Option<SharedSecret>,

    /// Status for "authorization required" answered to anonymous callers.
    pub authorization_required_status: u16,

    pub policy: PolicySettings,

    pub role_capabilities: RoleCapabilities,

    /// Accounts served by the in-memory user directory.
    pub users: Vec<UserRecord>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            issuer: "http://localhost:8080".to_string(),
            jwt_secret: None,
            authorization_required_status: 401,
            policy: PolicySettings::default(),
            role_capabilities: RoleCapabilities::default(),
            users: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load from `WPC_AUTH_CONFIG` (if set) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.with_overrides(|var| std::env::var(var).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_VAR) {
            self.bind_addr = bind;
        }
        if let Some(secret) = lookup(JWT_SECRET_VAR) {
            self.jwt_secret = Some(SharedSecret::new(secret));
        }
        if let Some(secret) = lookup(SHARED_SECRET_VAR) {
            self.policy.shared_secret = Some(SharedSecret::new(secret));
        }
        if let Some(mode) = lookup(CORS_MODE_VAR) {
            self.policy.cors_mode = mode.parse().map_err(|message| ConfigError::InvalidEnv {
                var: CORS_MODE_VAR,
                message,
            })?;
        }
        if let Some(window) = lookup(TOKEN_WINDOW_VAR) {
            self.policy.token_window = window.parse().map_err(|message| ConfigError::InvalidEnv {
                var: TOKEN_WINDOW_VAR,
                message,
            })?;
        }

        if self.jwt_secret.is_none() {
            tracing::warn!("{JWT_SECRET_VAR} not set; token issuance and bearer authentication are disabled");
        }
        Ok(self)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(400..500).contains(&self.authorization_required_status) {
            return Err(ConfigError::InvalidStatus(self.authorization_required_status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use wpcauth_auth::{CorsModeSetting, TokenWindow};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = GatewayConfig::default()
            .with_overrides(env(&[
                (BIND_VAR, "127.0.0.1:9000"),
                (JWT_SECRET_VAR, "signing-key"),
                (SHARED_SECRET_VAR, "campus"),
                (CORS_MODE_VAR, "secret_gated"),
                (TOKEN_WINDOW_VAR, "48h"),
            ]))
            .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert!(config.jwt_secret.is_some());
        assert_eq!(config.policy.shared_secret, Some(SharedSecret::new("campus")));
        assert_eq!(config.policy.cors_mode, CorsModeSetting::SecretGated);
        assert_eq!(config.policy.token_window, TokenWindow::BrowserApp);
    }

    #[test]
    fn invalid_environment_values_are_reported() {
        let err = GatewayConfig::default()
            .with_overrides(env(&[(TOKEN_WINDOW_VAR, "forever")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: TOKEN_WINDOW_VAR, .. }));
    }

    #[test]
    fn parses_json_configuration() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "issuer": "https://wpcampus.org",
            "jwt_secret": "signing-key",
            "policy": { "token_window": "browser_app", "extra_public_routes": ["/wpcampus/data/speakers"] },
            "users": [{ "profile": { "ID": 7, "user_login": "jane" }, "roles": ["administrator"] }],
        }))
        .unwrap();

        assert_eq!(config.issuer, "https://wpcampus.org");
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.authorization_required_status, 401);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = GatewayConfig::from_file(Path::new("/nonexistent/wpcauth.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn status_must_be_a_client_error() {
        let config = GatewayConfig {
            authorization_required_status: 500,
            ..GatewayConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidStatus(500))));
    }
}

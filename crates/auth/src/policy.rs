//! Immutable policy bundle built once at startup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use wpcauth_core::RoutePath;

use crate::{
    Capability, CorsMode, HeaderPolicy, OriginPattern, RedactionPolicy, RoutePolicy, SecretGate, SharedSecret,
    TokenPolicy, TokenWindow, UserProjector, DEFAULT_API_PREFIX, DEFAULT_PUBLIC_ROUTES, DEFAULT_SECRET_HEADER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorsModeSetting {
    #[default]
    Permissive,
    SecretGated,
    AllowedOrigins,
}

impl core::str::FromStr for CorsModeSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "permissive" => Ok(CorsModeSetting::Permissive),
            "secret_gated" => Ok(CorsModeSetting::SecretGated),
            "allowed_origins" => Ok(CorsModeSetting::AllowedOrigins),
            other => Err(format!("unknown cors mode '{other}'")),
        }
    }
}

/// Deployment-facing policy knobs (deserialized from configuration).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySettings {
    /// REST prefix stripped from request paths.
    pub api_prefix: String,
    /// Routes open to anonymous callers. Replaces the built-in list.
    pub public_routes: Vec<RoutePath>,
    /// Routes added on top of `public_routes`.
    pub extra_public_routes: Vec<RoutePath>,
    /// Capability that unlocks every non-public route.
    pub required_capability: Capability,
    pub token_window: TokenWindow,
    /// Enables the secret gate when set.
    pub shared_secret: Option<SharedSecret>,
    pub secret_header: String,
    pub cors_mode: CorsModeSetting,
    /// Regex patterns, used by `cors_mode = "allowed_origins"`.
    pub allowed_origins: Vec<String>,
    pub redaction: RedactionPolicy,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            public_routes: DEFAULT_PUBLIC_ROUTES.iter().map(|r| RoutePath::new(r)).collect(),
            extra_public_routes: Vec::new(),
            required_capability: Capability::default(),
            token_window: TokenWindow::default(),
            shared_secret: None,
            secret_header: DEFAULT_SECRET_HEADER.to_string(),
            cors_mode: CorsModeSetting::default(),
            allowed_origins: Vec::new(),
            redaction: RedactionPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("shared secret is configured but empty")]
    EmptySharedSecret,

    #[error("secret header name must not be empty")]
    EmptySecretHeader,

    #[error("invalid origin pattern '{pattern}': {source}")]
    InvalidOriginPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cors mode 'allowed_origins' needs at least one origin pattern")]
    NoAllowedOrigins,
}

/// All policy components, ready to be shared read-only across requests.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub routes: RoutePolicy,
    pub tokens: TokenPolicy,
    pub headers: HeaderPolicy,
    pub projector: UserProjector,
}

impl PolicyConfig {
    pub fn from_settings(settings: &PolicySettings) -> Result<Self, PolicyError> {
        let gate = match &settings.shared_secret {
            Some(secret) if secret.is_empty() => return Err(PolicyError::EmptySharedSecret),
            Some(secret) => {
                let header = settings.secret_header.trim();
                if header.is_empty() {
                    return Err(PolicyError::EmptySecretHeader);
                }
                Some(SecretGate::new(secret.clone(), header))
            }
            None => None,
        };

        let mode = match settings.cors_mode {
            CorsModeSetting::Permissive => CorsMode::Permissive,
            CorsModeSetting::SecretGated => CorsMode::SecretGated,
            CorsModeSetting::AllowedOrigins => {
                if settings.allowed_origins.is_empty() {
                    return Err(PolicyError::NoAllowedOrigins);
                }
                let patterns = settings
                    .allowed_origins
                    .iter()
                    .map(|pattern| {
                        OriginPattern::new(pattern).map_err(|source| PolicyError::InvalidOriginPattern {
                            pattern: pattern.clone(),
                            source,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                CorsMode::AllowedOrigins(patterns)
            }
        };

        let projector = UserProjector::new(settings.redaction.clone());

        let routes = RoutePolicy::new(
            settings.api_prefix.clone(),
            settings
                .public_routes
                .iter()
                .chain(settings.extra_public_routes.iter())
                .cloned(),
            settings.required_capability.clone(),
        );

        let mut tokens = TokenPolicy::new(settings.token_window, projector.clone());
        if let Some(gate) = &gate {
            tokens = tokens.with_secret_gate(gate.clone());
        }

        let headers = HeaderPolicy::new(mode, gate.as_ref().map(|g| g.header_name().to_string()));

        tracing::debug!(
            public_routes = routes.public_routes().count(),
            secret_gate = gate.is_some(),
            token_window = ?settings.token_window,
            cors_mode = ?settings.cors_mode,
            "policy configured"
        );

        Ok(Self {
            routes,
            tokens,
            headers,
            projector,
        })
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let projector = UserProjector::default();
        Self {
            routes: RoutePolicy::default(),
            tokens: TokenPolicy::new(TokenWindow::default(), projector.clone()),
            headers: HeaderPolicy::default(),
            projector,
        }
    }
}

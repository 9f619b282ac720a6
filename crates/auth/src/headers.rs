//! CORS and caching headers attached to every REST response.

use std::collections::BTreeSet;

use regex::Regex;

use wpcauth_core::RoutePath;

use crate::route_policy::{CURRENT_USER_ROUTE, TOKEN_ROUTE};

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const VARY: &str = "Vary";

pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate, max-age=0";
pub const BASE_ALLOWED_HEADERS: &str = "Accept, Authorization, Content-Type";
pub const ALLOWED_METHODS: &str = "GET";

/// Origin pattern matched against the request's `Origin` header.
#[derive(Debug, Clone)]
pub struct OriginPattern(Regex);

impl OriginPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self(Regex::new(pattern)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn matches(&self, origin: &str) -> bool {
        self.0.is_match(origin)
    }
}

impl PartialEq for OriginPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Who may read responses cross-origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CorsMode {
    /// `*` on every route.
    #[default]
    Permissive,
    /// `*` on token issuance and current-user routes only.
    SecretGated,
    /// Echo the request origin when it matches one of the patterns.
    AllowedOrigins(Vec<OriginPattern>),
}

/// Ordered list of response headers. `Vary` is meant to be appended, not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(Vec<(&'static str, String)>);

impl ResponseHeaders {
    fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(n, v)| (*n, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    mode: CorsMode,
    secret_header: Option<String>,
    gated_routes: BTreeSet<RoutePath>,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::new(CorsMode::default(), None)
    }
}

impl HeaderPolicy {
    /// `secret_header` is advertised in `Access-Control-Allow-Headers` when the
    /// shared-secret gate is enabled.
    pub fn new(mode: CorsMode, secret_header: Option<String>) -> Self {
        Self {
            mode,
            secret_header,
            gated_routes: [TOKEN_ROUTE, CURRENT_USER_ROUTE].into_iter().map(RoutePath::new).collect(),
        }
    }

    pub fn mode(&self) -> &CorsMode {
        &self.mode
    }

    /// Headers for a response to `route`. Independent of the access decision.
    pub fn decorate(&self, route: &RoutePath, origin: Option<&str>) -> ResponseHeaders {
        let mut headers = ResponseHeaders::default();

        if let Some(allowed) = self.allowed_origin(route, origin) {
            headers.push(ALLOW_ORIGIN, allowed);
        }

        let allowed_headers = match &self.secret_header {
            Some(name) => format!("{BASE_ALLOWED_HEADERS}, {name}"),
            None => BASE_ALLOWED_HEADERS.to_string(),
        };
        headers.push(ALLOW_HEADERS, allowed_headers);
        headers.push(ALLOW_METHODS, ALLOWED_METHODS);
        headers.push(CACHE_CONTROL, NO_CACHE);
        headers.push(VARY, "Origin");
        headers
    }

    fn allowed_origin(&self, route: &RoutePath, origin: Option<&str>) -> Option<String> {
        match &self.mode {
            CorsMode::Permissive => Some("*".to_string()),
            CorsMode::SecretGated => self.gated_routes.contains(route).then(|| "*".to_string()),
            CorsMode::AllowedOrigins(patterns) => {
                let origin = origin?;
                patterns
                    .iter()
                    .any(|p| p.matches(origin))
                    .then(|| origin.to_string())
            }
        }
    }
}

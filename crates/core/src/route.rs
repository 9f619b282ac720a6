//! Canonical REST route identifiers.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Paths on which `?rest_route=` names the route (plain permalinks).
const PLAIN_PERMALINK_PATHS: [&str; 2] = ["/", "/index.php"];

/// Normalized, method-agnostic REST route (e.g. `/wp/v2/posts`).
///
/// Always starts with a single `/`, never ends with one (except the root
/// route itself) and never contains empty segments. The REST prefix
/// (`/wp-json`), query string and fragment are not part of a route.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoutePath(String);

impl RoutePath {
    /// Normalize an already prefix-free route (as found in configuration).
    pub fn new(path: &str) -> Self {
        Self(normalize_segments(path))
    }

    /// Normalize an inbound request target into the route it addresses.
    ///
    /// Handles both pretty permalinks (`/wp-json/wp/v2/posts?page=2`) and the
    /// plain form (`/?rest_route=/wp/v2/posts`).
    pub fn from_request(target: &str, api_prefix: &str) -> Self {
        let target = target.split_once('#').map_or(target, |(before, _)| before);
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let path = normalize_segments(path);
        let prefix = normalize_segments(api_prefix);

        // `rest_route` is only honoured on the site front controller.
        if PLAIN_PERMALINK_PATHS.contains(&path.as_str()) {
            if let Some(route) = query.and_then(rest_route_param) {
                return Self::new(&route);
            }
        }

        Self(strip_route_prefix(path, &prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

fn normalize_segments(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

fn strip_route_prefix(path: String, prefix: &str) -> String {
    if prefix == "/" {
        return path;
    }
    if path == prefix {
        return "/".to_string();
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path,
    }
}

fn rest_route_param(query: &str) -> Option<String> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("rest_route="))
        .map(|raw| {
            urlencoding::decode(raw)
                .unwrap_or(Cow::Borrowed(raw))
                .into_owned()
        })
}

impl core::fmt::Display for RoutePath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoutePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoutePath {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for RoutePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<RoutePath> for String {
    fn from(value: RoutePath) -> Self {
        value.0
    }
}

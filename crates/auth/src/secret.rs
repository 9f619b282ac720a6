use serde::Deserialize;

/// Default request header carrying the shared secret.
pub const DEFAULT_SECRET_HEADER: &str = "WPC-Auth-Secret-Key";

/// Process-wide shared secret, read once at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw secret bytes, for key material.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Exact, case-sensitive comparison against a request-supplied value.
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| c == self.0)
    }
}

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

/// Shared-secret header check guarding token issuance and the header policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretGate {
    secret: SharedSecret,
    header_name: String,
}

impl SecretGate {
    pub fn new(secret: SharedSecret, header_name: impl Into<String>) -> Self {
        Self {
            secret,
            header_name: header_name.into(),
        }
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn admits(&self, header_value: Option<&str>) -> bool {
        self.secret.matches(header_value)
    }
}

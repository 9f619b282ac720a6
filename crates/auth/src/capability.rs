use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Capability identifier (e.g. `"manage_options"`).
///
/// Capabilities are opaque strings at this layer. Whether a principal holds one
/// is decided by the boolean stored next to it in the principal's capability
/// map, so a capability may be present and explicitly denied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

/// Site management capability; required for non-public REST routes by default.
pub const MANAGE_OPTIONS: Capability = Capability(Cow::Borrowed("manage_options"));

impl Capability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Capability {
    fn default() -> Self {
        MANAGE_OPTIONS
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Capability {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

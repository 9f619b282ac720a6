//! Redacted, externally safe view of an [`Identity`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Identity;

/// Fields removed from every projection regardless of configuration.
pub const ALWAYS_REDACTED: [&str; 3] = ["user_pass", "user_nicename", "user_activation_key"];

/// Account state flags, removed unless a deployment opts out.
pub const ACCOUNT_FLAGS: [&str; 3] = ["user_status", "spam", "deleted"];

const PROJECTION_KEYS: [&str; 2] = ["roles", "caps"];

/// Which identity fields are stripped before a profile leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactionPolicy {
    /// Also strip [`ACCOUNT_FLAGS`]. On by default.
    pub redact_account_flags: bool,

    /// Additional deployment-specific fields to strip.
    pub extra_fields: Vec<String>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            redact_account_flags: true,
            extra_fields: Vec::new(),
        }
    }
}

impl RedactionPolicy {
    pub fn is_redacted(&self, field: &str) -> bool {
        ALWAYS_REDACTED.contains(&field)
            || (self.redact_account_flags && ACCOUNT_FLAGS.contains(&field))
            || self.extra_fields.iter().any(|f| f == field)
    }
}

/// Public profile: remaining data fields plus `roles` and `caps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedUser {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub roles: Vec<String>,
    pub caps: BTreeMap<String, bool>,
}

impl ProjectedUser {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserProjector {
    policy: RedactionPolicy,
}

impl UserProjector {
    pub fn new(policy: RedactionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Copy the identity's profile out, minus redacted fields.
    ///
    /// The identity is only borrowed; callers may keep using it afterwards.
    /// Callers are expected to have run [`Identity::validate`] first.
    pub fn project(&self, identity: &Identity) -> ProjectedUser {
        let mut fields = match serde_json::to_value(identity.data()) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(user_id = %identity.id(), "user profile did not serialize to an object");
                Map::new()
            }
        };
        fields.retain(|key, _| !self.policy.is_redacted(key) && !PROJECTION_KEYS.contains(&key.as_str()));

        ProjectedUser {
            fields,
            roles: identity.roles().iter().map(|r| r.as_str().to_owned()).collect(),
            caps: identity
                .caps()
                .iter()
                .map(|(cap, granted)| (cap.as_str().to_owned(), *granted))
                .collect(),
        }
    }
}

//! Authenticated principal records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use wpcauth_core::UserId;

use crate::{AuthError, Capability, Role};

/// Stored profile fields of a user account.
///
/// Field names follow the user store's column names because they are also the
/// keys of the projected JSON object. Includes sensitive columns; see
/// [`UserProjector`](crate::UserProjector) for what may leave the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(rename = "ID")]
    pub id: UserId,
    pub user_login: String,
    #[serde(default)]
    pub user_pass: String,
    #[serde(default)]
    pub user_nicename: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_url: String,
    #[serde(default)]
    pub user_registered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_activation_key: String,
    #[serde(default)]
    pub user_status: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub spam: bool,
    #[serde(default)]
    pub deleted: bool,

    /// Site-specific profile fields.
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl UserData {
    pub fn new(id: UserId, login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            id,
            user_nicename: login.to_lowercase(),
            display_name: login.clone(),
            user_login: login,
            ..Default::default()
        }
    }
}

/// The authenticated principal.
///
/// Supplied per request by the credential layer and never persisted here.
/// `caps` is the effective map (role grants merged with direct grants).
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    data: UserData,
    roles: Vec<Role>,
    caps: BTreeMap<Capability, bool>,
}

impl Identity {
    pub fn new(data: UserData, roles: Vec<Role>, caps: BTreeMap<Capability, bool>) -> Self {
        Self { data, roles, caps }
    }

    pub fn id(&self) -> UserId {
        self.data.id
    }

    pub fn login(&self) -> &str {
        &self.data.user_login
    }

    pub fn data(&self) -> &UserData {
        &self.data
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn caps(&self) -> &BTreeMap<Capability, bool> {
        &self.caps
    }

    /// Whether the capability is present *and* granted.
    pub fn has_cap(&self, capability: &Capability) -> bool {
        self.caps.get(capability).copied().unwrap_or(false)
    }

    /// Check the fields every consumer relies on before projecting.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.data.id.is_anonymous() {
            return Err(AuthError::InvalidIdentity("missing user id".into()));
        }
        if self.data.user_login.trim().is_empty() {
            return Err(AuthError::InvalidIdentity(format!(
                "user {} has no login",
                self.data.id
            )));
        }
        Ok(())
    }
}

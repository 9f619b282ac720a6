//! User store consulted by the credential layer.

use std::collections::{BTreeMap, HashMap};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use serde::Deserialize;

use wpcauth_auth::{Capability, Identity, Role, RoleCapabilities, UserData};
use wpcauth_core::UserId;

use crate::config::ConfigError;

/// Account as configured: profile, roles and direct capability grants.
///
/// `profile.user_pass` holds an argon2 PHC string.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord {
    pub profile: UserData,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub caps: BTreeMap<Capability, bool>,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Option<Identity>;

    /// Resolve a login/password pair; `None` when either is wrong.
    async fn verify_login(&self, login: &str, password: &str) -> Option<Identity>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<UserId, Identity>,
    logins: HashMap<String, UserId>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured records, resolving effective capabilities once.
    pub fn from_records(records: &[UserRecord], roles: &RoleCapabilities) -> Result<Self, ConfigError> {
        let mut directory = Self::new();
        for record in records {
            let caps = roles.effective(&record.roles, &record.caps);
            let identity = Identity::new(record.profile.clone(), record.roles.clone(), caps);
            directory.insert(identity)?;
        }
        Ok(directory)
    }

    pub fn insert(&mut self, identity: Identity) -> Result<(), ConfigError> {
        let login = identity.login().to_lowercase();
        if self.users.contains_key(&identity.id()) || self.logins.contains_key(&login) {
            return Err(ConfigError::DuplicateUser(identity.login().to_string()));
        }
        self.logins.insert(login, identity.id());
        self.users.insert(identity.id(), identity);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Option<Identity> {
        self.users.get(&id).cloned()
    }

    async fn verify_login(&self, login: &str, password: &str) -> Option<Identity> {
        let id = self.logins.get(&login.to_lowercase())?;
        let identity = self.users.get(id)?.clone();

        let hash = identity.data().user_pass.clone();
        let password = password.to_owned();
        // Hashing is CPU-bound.
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .unwrap_or(false);

        verified.then_some(identity)
    }
}

fn verify_password(phc: &str, password: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password is not a PHC string");
            false
        }
    }
}

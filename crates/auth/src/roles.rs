use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Capability;

/// Role label (e.g. `"administrator"`, `"subscriber"`).
///
/// Roles are opaque strings at this layer; what a role grants is described by
/// a [`RoleCapabilities`] table supplied by the user store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role → capability grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleCapabilities(BTreeMap<Role, BTreeMap<Capability, bool>>);

impl RoleCapabilities {
    pub fn new(table: BTreeMap<Role, BTreeMap<Capability, bool>>) -> Self {
        Self(table)
    }

    pub fn grants(&self, role: &Role) -> Option<&BTreeMap<Capability, bool>> {
        self.0.get(role)
    }

    /// Effective capability map for a principal.
    ///
    /// Role grants are merged in role order (later roles win), every role name
    /// is itself granted as a capability, and direct grants are applied last so
    /// they can both add and revoke.
    pub fn effective(
        &self,
        roles: &[Role],
        direct: &BTreeMap<Capability, bool>,
    ) -> BTreeMap<Capability, bool> {
        let mut caps = BTreeMap::new();
        for role in roles {
            if let Some(grants) = self.grants(role) {
                caps.extend(grants.iter().map(|(cap, granted)| (cap.clone(), *granted)));
            }
            caps.insert(Capability::new(role.as_str().to_owned()), true);
        }
        caps.extend(direct.iter().map(|(cap, granted)| (cap.clone(), *granted)));
        caps
    }
}

impl Default for RoleCapabilities {
    fn default() -> Self {
        let grant = |caps: &[&'static str]| -> BTreeMap<Capability, bool> {
            caps.iter().map(|c| (Capability::new(*c), true)).collect()
        };

        let mut table = BTreeMap::new();
        table.insert(
            Role::new("administrator"),
            grant(&["manage_options", "edit_posts", "edit_others_posts", "list_users", "read"]),
        );
        table.insert(Role::new("editor"), grant(&["edit_posts", "edit_others_posts", "read"]));
        table.insert(Role::new("author"), grant(&["edit_posts", "read"]));
        table.insert(Role::new("subscriber"), grant(&["read"]));
        Self(table)
    }
}

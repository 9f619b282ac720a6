use wpcauth_auth::Identity;
use wpcauth_core::RoutePath;

/// Authenticated caller, inserted by the access middleware when a bearer
/// token resolved to a user.
#[derive(Debug, Clone)]
pub struct CurrentUser(Identity);

impl CurrentUser {
    pub fn new(identity: Identity) -> Self {
        Self(identity)
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// Normalized route of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRoute(RoutePath);

impl RequestRoute {
    pub fn new(route: RoutePath) -> Self {
        Self(route)
    }

    pub fn route(&self) -> &RoutePath {
        &self.0
    }
}

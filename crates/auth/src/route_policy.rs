//! Per-request route access decisions.

use std::collections::BTreeSet;

use wpcauth_core::RoutePath;

use crate::{AuthFailure, Capability, ErrorKind, FailureCause, MANAGE_OPTIONS};

pub const LOGIN_REQUIRED_CODE: &str = "wpcampus_auth_rest_login_required";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Only authenticated users can access this route.";

/// REST prefix stripped from request paths by default.
pub const DEFAULT_API_PREFIX: &str = "/wp-json";

pub const TOKEN_ROUTE: &str = "/jwt-auth/v1/token";
pub const TOKEN_VALIDATE_ROUTE: &str = "/jwt-auth/v1/token/validate";
pub const CURRENT_USER_ROUTE: &str = "/wpcampus/auth/user";

/// Routes reachable without any identity unless a deployment overrides them.
pub const DEFAULT_PUBLIC_ROUTES: [&str; 7] = [
    TOKEN_ROUTE,
    TOKEN_VALIDATE_ROUTE,
    CURRENT_USER_ROUTE,
    "/wpcampus/data/notifications",
    "/wpcampus/data/public/sessions",
    "/wpcampus/data/videos",
    "/wp/v2/posts",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The principal holds the required capability.
    Allow,
    /// The route is open; no identity is required.
    AnonymousAllowed,
    Deny(Denial),
}

impl AccessDecision {
    pub fn is_permitted(&self) -> bool {
        !matches!(self, AccessDecision::Deny(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub reason: &'static str,
    pub status: u16,
}

impl Denial {
    pub fn to_cause(&self) -> FailureCause {
        FailureCause::new(self.code, self.reason, self.status)
    }
}

/// Allow-list plus capability requirement for every other route.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    api_prefix: String,
    public_routes: BTreeSet<RoutePath>,
    required_capability: Capability,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_API_PREFIX,
            DEFAULT_PUBLIC_ROUTES.iter().map(|r| RoutePath::new(r)),
            MANAGE_OPTIONS,
        )
    }
}

impl RoutePolicy {
    pub fn new(
        api_prefix: impl Into<String>,
        public_routes: impl IntoIterator<Item = RoutePath>,
        required_capability: Capability,
    ) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            public_routes: public_routes.into_iter().collect(),
            required_capability,
        }
    }

    pub fn with_public_route(mut self, route: RoutePath) -> Self {
        self.public_routes.insert(route);
        self
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn required_capability(&self) -> &Capability {
        &self.required_capability
    }

    pub fn public_routes(&self) -> impl Iterator<Item = &RoutePath> {
        self.public_routes.iter()
    }

    pub fn is_public(&self, route: &RoutePath) -> bool {
        self.public_routes.contains(route)
    }

    /// Normalize an inbound request target (path and query).
    pub fn route_for(&self, target: &str) -> RoutePath {
        RoutePath::from_request(target, &self.api_prefix)
    }

    /// Decide whether a request to `route` may proceed.
    ///
    /// The allow-list is consulted before `capability_check`, which is not
    /// called at all for public routes. `authorization_required` is the
    /// credential layer's status for "authorization required".
    pub fn evaluate<F>(
        &self,
        route: &RoutePath,
        has_credential: bool,
        capability_check: F,
        authorization_required: u16,
    ) -> AccessDecision
    where
        F: FnOnce() -> bool,
    {
        if self.is_public(route) {
            tracing::debug!(%route, "public route");
            return AccessDecision::AnonymousAllowed;
        }

        if capability_check() {
            tracing::debug!(%route, capability = %self.required_capability, "capability granted");
            return AccessDecision::Allow;
        }

        let kind = if has_credential {
            ErrorKind::Unauthorized
        } else {
            ErrorKind::Unauthenticated
        };
        tracing::info!(%route, ?kind, status = authorization_required, "route access denied");
        AccessDecision::Deny(Denial {
            kind,
            code: LOGIN_REQUIRED_CODE,
            reason: LOGIN_REQUIRED_MESSAGE,
            status: authorization_required,
        })
    }

    /// Combine a decision with whatever the credential layer already reported.
    ///
    /// A denial is attached to an existing upstream failure (both causes stay
    /// visible) or becomes a fresh one. A permitted decision never clears an
    /// upstream failure.
    pub fn gate(decision: AccessDecision, upstream: Option<AuthFailure>) -> Result<(), AuthFailure> {
        match (decision, upstream) {
            (AccessDecision::Deny(denial), Some(mut failure)) => {
                failure.add(denial.to_cause());
                Err(failure)
            }
            (AccessDecision::Deny(denial), None) => Err(AuthFailure::new(denial.to_cause())),
            (_, Some(failure)) => Err(failure),
            (_, None) => Ok(()),
        }
    }
}

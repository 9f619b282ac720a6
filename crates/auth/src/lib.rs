//! `wpcauth-auth`: route access decisions and token enrichment (pure policy).
//!
//! No HTTP and no storage here. The gateway feeds in normalized routes,
//! resolved identities and collaborator status codes.

pub mod capability;
pub mod claims;
pub mod error;
pub mod headers;
pub mod identity;
pub mod policy;
pub mod projector;
pub mod roles;
pub mod route_policy;
pub mod secret;
pub mod token;

pub use capability::{Capability, MANAGE_OPTIONS};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use error::{AuthError, AuthFailure, ErrorKind, FailureCause};
pub use headers::{
    CorsMode, HeaderPolicy, OriginPattern, ResponseHeaders, ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN,
    CACHE_CONTROL, VARY,
};
pub use identity::{Identity, UserData};
pub use policy::{CorsModeSetting, PolicyConfig, PolicyError, PolicySettings};
pub use projector::{ProjectedUser, RedactionPolicy, UserProjector};
pub use roles::{Role, RoleCapabilities};
pub use route_policy::{
    AccessDecision, Denial, RoutePolicy, CURRENT_USER_ROUTE, DEFAULT_API_PREFIX, DEFAULT_PUBLIC_ROUTES,
    TOKEN_ROUTE, TOKEN_VALIDATE_ROUTE,
};
pub use secret::{SecretGate, SharedSecret, DEFAULT_SECRET_HEADER};
pub use token::{
    TokenHooks, TokenIssuanceResult, TokenPolicy, TokenResponsePayload, TokenWindow, BROWSER_APP_WINDOW_SECS,
    DEFAULT_TOKEN_WINDOW, STANDARD_WINDOW_SECS,
};

//! `wpcauth-core`: domain primitives shared by the policy engine and the gateway.
//!
//! This crate contains **pure domain** primitives (no HTTP, no IO).

pub mod error;
pub mod id;
pub mod route;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use route::RoutePath;

//! HTTP gateway: configuration, credential layer, middleware and routes.

pub mod app;
pub mod config;
pub mod context;
pub mod credentials;
pub mod directory;
pub mod middleware;

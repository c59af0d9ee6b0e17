//! HTTP transport for the request-resolution pipeline: authentication
//! middleware, gateway configuration, and the Axum host that wires
//! `rm_apicore`'s router into a running server.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod auth;
pub mod config;
pub mod middleware;
pub mod module;

pub use auth::{AuthState, AuthnClient, AuthnError};
pub use config::ApiGatewayConfig;
pub use module::GatewayHost;

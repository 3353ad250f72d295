//! # ContentGateway
//!
//! Read/write REST surface over the engagement engines. The gateway applies
//! role gating and maps engine errors to HTTP; it performs no engagement
//! logic of its own. Authentication happens upstream — the gateway only
//! consumes the identity carried by the request's bearer token.

pub mod auth;
pub mod config;
pub mod error;
pub mod rest_api;

pub use auth::{Identity, IdentityVerifier};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use rest_api::{create_routes, GatewayContext};

//! Gateway configuration

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Configuration for the ContentGateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// HS256 secret used to verify identity tokens. Injected by the
    /// deployment (environment or config file); there is deliberately no
    /// default value.
    #[serde(skip_serializing, default)]
    pub jwt_secret: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, jwt_secret: String::new() }
    }
}

impl GatewayConfig {
    /// Validate the configuration. The JWT secret must have been supplied.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.jwt_secret.is_empty() {
            return Err(GatewayError::Config(
                "identity token secret is not configured (set PLATFORM_JWT_SECRET)".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(GatewayError::Config("invalid gateway port: 0".to_string()));
        }
        Ok(())
    }

    /// The socket address to bind
    pub fn bind_addr(&self) -> GatewayResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GatewayError::Config(format!("invalid bind address: {e}")))
    }
}

//! Identity extraction for the ContentGateway
//!
//! The platform's auth service issues HS256 tokens; this module only
//! verifies and decodes them into an [`Identity`]. The shared secret is
//! injected through configuration and never appears in source.

use crate::error::GatewayError;
use content_store::{Role, UserId};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id)
    pub sub: String,
    /// User role
    pub role: String,
    /// Expiration time
    pub exp: u64,
}

/// The authenticated caller, as asserted by the upstream auth service
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

/// Verifies bearer tokens into identities
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a bearer token and extract the caller's identity
    pub fn verify(&self, token: &str) -> Result<Identity, GatewayError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| GatewayError::Authentication(format!("invalid token: {e}")))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| GatewayError::Authentication("malformed subject claim".to_string()))?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|_| GatewayError::Authentication("unknown role claim".to_string()))?;

        Ok(Identity { user_id, role })
    }
}

/// Strip the `Bearer ` prefix from an Authorization header value
pub fn bearer_token(header: &str) -> Result<&str, GatewayError> {
    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| GatewayError::Authentication("expected bearer token".to_string()))
}

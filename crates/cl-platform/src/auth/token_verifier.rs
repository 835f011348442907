//! Access token verification
//!
//! Tokens are issued by the identity provider and signed with its shared HS256 secret.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cl_config::IdentityConfig;

use crate::auth::user_context::UserContext;
use crate::shared::error::{Result, ServiceError};

/// Claims read from an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// `audience` is only checked when given.
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        let audience = Some(config.jwt_audience.trim()).filter(|a| !a.is_empty());
        Self::new(&config.jwt_secret, audience)
    }

    /// Verify a token and resolve the principal it identifies.
    pub fn verify(&self, token: &str) -> Result<UserContext> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                match e.kind() {
                    ErrorKind::ExpiredSignature => ServiceError::unauthorized("Token expired"),
                    _ => ServiceError::unauthorized("Invalid token"),
                }
            })?;

        let user_id = claims
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or_else(|| ServiceError::unauthorized("Invalid token payload"))?;

        Ok(UserContext {
            user_id,
            email: claims.email,
        })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

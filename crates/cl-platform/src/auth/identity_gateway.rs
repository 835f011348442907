//! Identity Provider Gateway
//!
//! Password sign-in, sign-up and sign-out against Supabase GoTrue
//! (`/auth/v1/*`). The gateway is built once at startup and shared.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use cl_config::IdentityConfig;

use crate::shared::error::{Result, ServiceError};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials or session not found";
const SIGN_UP_FAILED_MESSAGE: &str = "Error creating user";
const LOGOUT_FAILED_MESSAGE: &str = "Error during logout";

/// Session returned by a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Account created by sign-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<RegisteredUser>;

    /// Invalidate the session behind `access_token`, if any.
    async fn sign_out(&self, access_token: Option<&str>) -> Result<()>;
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// GoTrue error bodies vary between versions.
#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProviderError {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Sign-up answers with either a bare user or a session carrying the user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session { user: RegisteredUser },
    User(RegisteredUser),
}

pub struct SupabaseGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseGateway {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ServiceError::internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(url = %config.url, "Initialized identity provider gateway");

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity provider unreachable during sign-in");
                ServiceError::unauthorized(INVALID_CREDENTIALS_MESSAGE)
            })?;

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "Sign-in rejected");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }

        let session: Session = response
            .json()
            .await
            .map_err(|_| ServiceError::unauthorized(INVALID_CREDENTIALS_MESSAGE))?;

        if session.access_token.is_empty() {
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<RegisteredUser> {
        let response = self
            .client
            .post(self.url("/signup"))
            .header("apikey", &self.api_key)
            .json(&PasswordCredentials { email, password })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity provider unreachable during sign-up");
                ServiceError::validation(SIGN_UP_FAILED_MESSAGE)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "Failed to read sign-up response");
            ServiceError::validation(SIGN_UP_FAILED_MESSAGE)
        })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ProviderError>(&body)
                .ok()
                .and_then(ProviderError::into_message)
                .unwrap_or_else(|| SIGN_UP_FAILED_MESSAGE.to_string());
            debug!(status = status.as_u16(), message = %message, "Sign-up rejected");
            return Err(ServiceError::validation(message));
        }

        let user = match serde_json::from_slice::<SignUpBody>(&body) {
            Ok(SignUpBody::Session { user }) | Ok(SignUpBody::User(user)) => user,
            _ => return Err(ServiceError::validation(SIGN_UP_FAILED_MESSAGE)),
        };

        if user.id.is_empty() {
            return Err(ServiceError::validation(SIGN_UP_FAILED_MESSAGE));
        }

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    async fn sign_out(&self, access_token: Option<&str>) -> Result<()> {
        // Without a session there is nothing to revoke upstream
        let Some(token) = access_token else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.url("/logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity provider unreachable during logout");
                ServiceError::internal(LOGOUT_FAILED_MESSAGE)
            })?;

        let status = response.status();
        // An already expired or revoked session counts as logged out
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        warn!(status = status.as_u16(), "Identity provider rejected logout");
        Err(ServiceError::internal(LOGOUT_FAILED_MESSAGE))
    }
}

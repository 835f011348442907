//! Auth API Endpoints
//!
//! - POST /auth/login - password sign-in, returns an access token
//! - POST /auth/signup - account registration
//! - POST /auth/logout - session invalidation

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::identity_gateway::IdentityProvider;
use crate::shared::api_common::{ApiJson, MessageResponse};
use crate::shared::error::ServiceError;
use crate::shared::middleware::OptionalBearer;

/// Email and password credentials
#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl CredentialsRequest {
    fn validate(&self) -> Result<(), ServiceError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::validation("email must be an email"));
        }
        if self.password.is_empty() {
            return Err(ServiceError::validation("password should not be empty"));
        }
        Ok(())
    }
}

/// Sign-in response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    /// JWT access token for authentication
    pub access_token: String,
}

/// Auth API state
#[derive(Clone)]
pub struct AuthState {
    pub identity: Arc<dyn IdentityProvider>,
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    operation_id = "postAuthLogin",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = SignInResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Json<SignInResponse>, ServiceError> {
    req.validate()?;
    let session = state.identity.sign_in(req.email.trim(), &req.password).await?;
    Ok(Json(SignInResponse {
        access_token: session.access_token,
    }))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    operation_id = "postAuthSignup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Provider rejected the registration")
    )
)]
pub async fn signup(
    State(state): State<AuthState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<StatusCode, ServiceError> {
    req.validate()?;
    state.identity.sign_up(req.email.trim(), &req.password).await?;
    Ok(StatusCode::CREATED)
}

/// Log out the current session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    operation_id = "postAuthLogout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 500, description = "Provider failed to end the session")
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AuthState>,
    OptionalBearer(token): OptionalBearer,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.identity.sign_out(token.as_deref()).await?;
    Ok(Json(MessageResponse::new("Logout successful")))
}

/// Create auth router
pub fn auth_router(state: AuthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(signup))
        .routes(routes!(logout))
        .with_state(state)
}

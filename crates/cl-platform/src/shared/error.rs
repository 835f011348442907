//! Service Error Types

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

pub const INVALID_UUID_MESSAGE: &str = "Invalid UUID format provided";
const CONSTRAINT_MESSAGE: &str = "Database constraint violation";
const DATABASE_MESSAGE: &str = "Internal database error";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    /// Failure reported by the identity provider or the movie catalog.
    /// `status` is the upstream HTTP status; `None` means the request never got a response.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    /// Input the datastore rejected (malformed UUID, constraint violation)
    #[error("{message}")]
    StorageConstraint { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream { status, message: message.into() }
    }

    /// Upstream answered 2xx but the body did not match the expected schema.
    pub fn upstream_schema(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(StatusCode::BAD_GATEWAY.as_u16()),
            message: message.into(),
        }
    }

    pub fn storage_constraint(message: impl Into<String>) -> Self {
        Self::StorageConstraint { message: message.into() }
    }

    pub fn invalid_uuid() -> Self {
        Self::storage_constraint(INVALID_UUID_MESSAGE)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::Upstream { status, .. } => match status {
                Some(code) => StatusCode::from_u16(*code)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                None => StatusCode::BAD_REQUEST,
            },
            ServiceError::StorageConstraint { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = ErrorResponse {
            status_code: status.as_u16(),
            message: self.to_string(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if message.contains("invalid input syntax for type uuid") {
                    return ServiceError::invalid_uuid();
                }
                if message.contains("violates")
                    || message.contains("constraint failed")
                    || db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                {
                    warn!(error = %message, "Datastore rejected write");
                    return ServiceError::storage_constraint(CONSTRAINT_MESSAGE);
                }
                error!(error = %err, "Database error");
                ServiceError::internal(DATABASE_MESSAGE)
            }
            _ => {
                error!(error = %err, "Database error");
                ServiceError::internal(DATABASE_MESSAGE)
            }
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::validation(rejection.body_text())
    }
}

//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod error;
pub mod middleware;
pub mod api_common;

// APIs
pub mod health_api;

// Re-export commonly used items
pub use error::{ErrorResponse, Result, ServiceError};
pub use middleware::{AppState, AuthLayer, Authenticated};
pub use api_common::{Paginated, PaginationMeta, PaginationParams};
pub use health_api::{health_router, HealthState};

//! CineList Platform
//!
//! Backend-for-frontend for a movie-list application:
//! - Sign-in, sign-up and sign-out proxied to the identity provider
//! - Read-only passthrough to the external movie catalog
//! - User-owned movie lists, enriched with live catalog details
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `service` - Business operations
//! - `api` - REST endpoints

pub mod auth;
pub mod catalog;
pub mod movie_list;

// Shared infrastructure
pub mod shared;

// Re-export common types from shared
pub use shared::error::{Result, ServiceError};

// Re-export main entity types for convenience
pub use auth::UserContext;
pub use catalog::{Genre, MovieDetails};
pub use movie_list::{MovieEntry, MovieList};

/// API re-exports used by the server binary
pub mod api {
    pub use crate::shared::middleware::{AppState, AuthLayer, Authenticated};
    pub use crate::shared::health_api::{health_router, HealthState};

    pub use crate::auth::auth_api::{auth_router, AuthState};
    pub use crate::catalog::api::{movies_router, MoviesState};
    pub use crate::movie_list::api::{movie_lists_router, MovieListsState};
}

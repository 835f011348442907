//! Movie List Aggregate
//!
//! User-owned, genre-scoped movie collections.

pub mod entity;
pub mod repository;
pub mod sqlite;
pub mod postgres;
pub mod enrichment;
pub mod service;
pub mod api;

// Re-export main types
pub use entity::{EnrichedMovieEntry, EnrichedMovieList, MovieEntry, MovieList};
pub use repository::MovieListRepository;
pub use sqlite::SqliteMovieListRepository;
pub use postgres::PostgresMovieListRepository;
pub use enrichment::ListEnricher;
pub use service::{
    CreateMovieListCommand, MembershipCommand, MembershipPolicy, MovieListService,
    UpdateMovieListCommand,
};
pub use api::{movie_lists_router, MovieListsState};

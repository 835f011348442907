//! Movie Catalog
//!
//! Client for the external movie catalog plus its public passthrough API.

pub mod api;
pub mod client;
pub mod dto;

pub use api::{movies_router, MoviesState};
pub use client::{MovieCatalog, TmdbClient};
pub use dto::{Genre, GenresResponse, MovieDetails, MoviePage, MovieSummary};

//! Movie catalog payloads
//!
//! Field names follow the TMDB wire format and are passed through unchanged.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::api_common::string_or_number;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenresResponse {
    pub genres: Vec<Genre>,
}

/// Movie as returned by search and listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub video: bool,
}

/// One page of movies
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoviePage {
    pub page: u32,
    pub results: Vec<MovieSummary>,
    pub total_pages: u32,
    pub total_results: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductionCompany {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    pub runtime: Option<i64>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub revenue: i64,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
}

impl MovieDetails {
    pub fn has_genre(&self, genre_id: i64) -> bool {
        self.genres.iter().any(|g| g.id == genre_id)
    }
}

/// Search parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchMoviesQuery {
    /// Free-text title query (required)
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub page: Option<u32>,
    #[serde(default)]
    pub include_adult: Option<bool>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub year: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub primary_release_year: Option<u32>,
}

/// Discover parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DiscoverMoviesQuery {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub year: Option<u32>,
    /// Comma separated genre ids, e.g. "28,12"
    #[serde(default)]
    pub with_genres: Option<String>,
    /// e.g. "popularity.desc"
    #[serde(default)]
    pub sort_by: Option<String>,
}

/// Page-only parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub page: Option<u32>,
}

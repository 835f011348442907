//! TMDB Catalog Client
//!
//! Thin HTTP wrapper over the movie catalog. The api key travels as the
//! `api_key` query parameter on every request.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use cl_config::CatalogConfig;

use crate::catalog::dto::{
    DiscoverMoviesQuery, Genre, GenresResponse, MovieDetails, MoviePage, SearchMoviesQuery,
};
use crate::shared::error::{Result, ServiceError};

/// Catalog lookups needed by the movie list workflow.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fails with NotFound when the genre does not exist.
    async fn get_genre_by_id(&self, genre_id: i64) -> Result<Genre>;

    /// Fails with NotFound when the catalog answers 404.
    async fn get_movie_by_id(&self, movie_id: i64) -> Result<MovieDetails>;
}

pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ServiceError::internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %config.base_url, "Initialized TMDB catalog client");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    pub async fn search_movies(&self, query: &SearchMoviesQuery) -> Result<MoviePage> {
        let text = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ServiceError::validation("Search query is required"))?;

        let mut params = vec![
            ("query", text.to_string()),
            ("page", query.page.unwrap_or(1).to_string()),
            ("include_adult", query.include_adult.unwrap_or(false).to_string()),
        ];
        if let Some(region) = query.region.as_deref().filter(|r| !r.is_empty()) {
            params.push(("region", region.to_string()));
        }
        if let Some(year) = query.year {
            params.push(("year", year.to_string()));
        }
        if let Some(year) = query.primary_release_year {
            params.push(("primary_release_year", year.to_string()));
        }

        self.get_json("/search/movie", &params, "Error searching movies", None).await
    }

    pub async fn get_genres(&self) -> Result<GenresResponse> {
        self.get_json("/genre/movie/list", &[], "Error fetching genres", None).await
    }

    pub async fn get_popular_movies(&self, page: u32) -> Result<MoviePage> {
        let params = [("page", page.to_string())];
        self.get_json("/movie/popular", &params, "Error fetching popular movies", None).await
    }

    pub async fn get_now_playing_movies(&self, page: u32) -> Result<MoviePage> {
        let params = [("page", page.to_string())];
        self.get_json("/movie/now_playing", &params, "Error fetching now playing movies", None)
            .await
    }

    pub async fn discover_movies(&self, query: &DiscoverMoviesQuery) -> Result<MoviePage> {
        let mut params = vec![("page", query.page.unwrap_or(1).to_string())];
        if let Some(year) = query.year {
            params.push(("primary_release_year", year.to_string()));
        }
        if let Some(genres) = query.with_genres.as_deref().filter(|g| !g.trim().is_empty()) {
            params.push(("with_genres", genres.trim().to_string()));
        }
        if let Some(sort_by) = query.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("sort_by", sort_by.trim().to_string()));
        }

        self.get_json("/discover/movie", &params, "Error discovering movies", None).await
    }

    pub async fn get_movie_details(&self, movie_id: i64) -> Result<MovieDetails> {
        self.get_json(
            &format!("/movie/{}", movie_id),
            &[],
            "Error fetching movie details",
            Some(format!("Movie with id {} not found", movie_id)),
        )
        .await
    }

    /// GET `path`, retrying transport failures and 5xx answers up to `max_retries` times.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        operation: &str,
        not_found_message: Option<String>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            debug!(url = %url, attempt, "Calling catalog");

            let sent = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())])
                .query(params)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    if attempt < self.max_retries {
                        attempt += 1;
                        warn!(url = %url, error = %e, attempt, "Catalog request failed, retrying");
                        continue;
                    }
                    warn!(url = %url, error = %e, "Catalog request failed");
                    return Err(ServiceError::upstream(None, operation));
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = response.bytes().await.map_err(|e| {
                    warn!(url = %url, error = %e, "Failed to read catalog response");
                    ServiceError::upstream(None, operation)
                })?;
                return serde_json::from_slice(&body).map_err(|e| {
                    warn!(url = %url, error = %e, "Unexpected catalog response shape");
                    ServiceError::upstream_schema(operation)
                });
            }

            if status.is_server_error() && attempt < self.max_retries {
                attempt += 1;
                warn!(url = %url, status = status.as_u16(), attempt, "Catalog returned server error, retrying");
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                if let Some(message) = not_found_message {
                    return Err(ServiceError::not_found(message));
                }
            }

            warn!(url = %url, status = status.as_u16(), "Catalog returned error");
            return Err(ServiceError::upstream(Some(status.as_u16()), operation));
        }
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn get_genre_by_id(&self, genre_id: i64) -> Result<Genre> {
        let genres = self.get_genres().await?;
        genres
            .genres
            .into_iter()
            .find(|g| g.id == genre_id)
            .ok_or_else(|| ServiceError::not_found(format!("Genre with id {} not found", genre_id)))
    }

    async fn get_movie_by_id(&self, movie_id: i64) -> Result<MovieDetails> {
        self.get_movie_details(movie_id).await
    }
}

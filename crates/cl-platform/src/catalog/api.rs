//! Movies API
//!
//! Public passthrough endpoints over the movie catalog.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::catalog::client::TmdbClient;
use crate::catalog::dto::{
    DiscoverMoviesQuery, GenresResponse, MovieDetails, MoviePage, PageQuery, SearchMoviesQuery,
};
use crate::shared::api_common::ApiQuery;
use crate::shared::error::ServiceError;

/// Movies API state
#[derive(Clone)]
pub struct MoviesState {
    pub catalog: Arc<TmdbClient>,
}

/// Search movies by title
#[utoipa::path(
    get,
    path = "/search",
    tag = "movies",
    operation_id = "searchMovies",
    params(SearchMoviesQuery),
    responses(
        (status = 200, description = "Search results", body = MoviePage),
        (status = 400, description = "Missing query or upstream failure")
    )
)]
pub async fn search_movies(
    State(state): State<MoviesState>,
    ApiQuery(query): ApiQuery<SearchMoviesQuery>,
) -> Result<Json<MoviePage>, ServiceError> {
    Ok(Json(state.catalog.search_movies(&query).await?))
}

/// List movie genres
#[utoipa::path(
    get,
    path = "/genres",
    tag = "movies",
    operation_id = "getGenres",
    responses(
        (status = 200, description = "Genres", body = GenresResponse)
    )
)]
pub async fn get_genres(
    State(state): State<MoviesState>,
) -> Result<Json<GenresResponse>, ServiceError> {
    Ok(Json(state.catalog.get_genres().await?))
}

/// Popular movies
#[utoipa::path(
    get,
    path = "/popular",
    tag = "movies",
    operation_id = "getPopularMovies",
    params(PageQuery),
    responses(
        (status = 200, description = "Popular movies", body = MoviePage)
    )
)]
pub async fn get_popular_movies(
    State(state): State<MoviesState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<MoviePage>, ServiceError> {
    let page = query.page.unwrap_or(1);
    Ok(Json(state.catalog.get_popular_movies(page).await?))
}

/// Movies now in theatres
#[utoipa::path(
    get,
    path = "/now-playing",
    tag = "movies",
    operation_id = "getNowPlayingMovies",
    params(PageQuery),
    responses(
        (status = 200, description = "Now playing movies", body = MoviePage)
    )
)]
pub async fn get_now_playing_movies(
    State(state): State<MoviesState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<MoviePage>, ServiceError> {
    let page = query.page.unwrap_or(1);
    Ok(Json(state.catalog.get_now_playing_movies(page).await?))
}

/// Discover movies by year and genres
#[utoipa::path(
    get,
    path = "/discover",
    tag = "movies",
    operation_id = "discoverMovies",
    params(DiscoverMoviesQuery),
    responses(
        (status = 200, description = "Matching movies", body = MoviePage)
    )
)]
pub async fn discover_movies(
    State(state): State<MoviesState>,
    ApiQuery(query): ApiQuery<DiscoverMoviesQuery>,
) -> Result<Json<MoviePage>, ServiceError> {
    Ok(Json(state.catalog.discover_movies(&query).await?))
}

/// Movie details
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "movies",
    operation_id = "getMovieById",
    params(
        ("id" = i64, Path, description = "Catalog movie ID")
    ),
    responses(
        (status = 200, description = "Movie details", body = MovieDetails),
        (status = 404, description = "Movie not found")
    )
)]
pub async fn get_movie_by_id(
    State(state): State<MoviesState>,
    Path(id): Path<String>,
) -> Result<Json<MovieDetails>, ServiceError> {
    let movie_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ServiceError::validation("Validation failed (numeric string is expected)"))?;
    Ok(Json(state.catalog.get_movie_details(movie_id).await?))
}

/// Create movies router
pub fn movies_router(state: MoviesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(search_movies))
        .routes(routes!(get_genres))
        .routes(routes!(get_popular_movies))
        .routes(routes!(get_now_playing_movies))
        .routes(routes!(discover_movies))
        .routes(routes!(get_movie_by_id))
        .with_state(state)
}

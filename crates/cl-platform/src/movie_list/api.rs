//! Movie Lists API
//!
//! Authenticated CRUD and membership endpoints. The owner is always the
//! caller; it is never read from the request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::catalog::dto::MovieDetails;
use crate::movie_list::entity::{EnrichedMovieEntry, EnrichedMovieList, MovieEntry, MovieList};
use crate::movie_list::service::{
    CreateMovieListCommand, MembershipCommand, MovieListService, UpdateMovieListCommand,
};
use crate::shared::api_common::{
    parse_uuid, string_or_number, ApiJson, ApiQuery, PaginationMeta, PaginationParams,
};
use crate::shared::error::{ErrorResponse, ServiceError};
use crate::shared::middleware::Authenticated;

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Create movie list request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieListRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Catalog genre id
    #[serde(deserialize_with = "string_or_number::deserialize_i64")]
    pub genre_id: i64,
    pub genre_name: String,
}

/// Update movie list request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieListRequest {
    /// Ignored when blank
    #[serde(default)]
    pub name: Option<String>,
    /// Applied whenever present, including `""` and `null`
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Add or remove a movie
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub list_id: String,
    #[serde(deserialize_with = "string_or_number::deserialize_i64")]
    pub movie_id: i64,
}

/// Movie list entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieEntryResponse {
    pub movie_id: i64,
    pub added_at: String,
}

impl From<&MovieEntry> for MovieEntryResponse {
    fn from(e: &MovieEntry) -> Self {
        Self {
            movie_id: e.movie_id,
            added_at: timestamp(e.added_at),
        }
    }
}

/// Movie list response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovieListResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub genre_id: i64,
    pub genre_name: String,
    pub owner_id: String,
    pub movies: Vec<MovieEntryResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<MovieList> for MovieListResponse {
    fn from(l: MovieList) -> Self {
        Self {
            id: l.id.to_string(),
            movies: l.movies.iter().map(MovieEntryResponse::from).collect(),
            name: l.name,
            description: l.description,
            genre_id: l.genre_id,
            genre_name: l.genre_name,
            owner_id: l.owner_id,
            created_at: timestamp(l.created_at),
            updated_at: timestamp(l.updated_at),
        }
    }
}

/// Entry with catalog details (`null` when the lookup failed)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMovieEntryResponse {
    pub movie_id: i64,
    pub added_at: String,
    pub movie_details: Option<MovieDetails>,
}

impl From<EnrichedMovieEntry> for EnrichedMovieEntryResponse {
    fn from(e: EnrichedMovieEntry) -> Self {
        Self {
            movie_id: e.movie_id,
            added_at: timestamp(e.added_at),
            movie_details: e.movie_details,
        }
    }
}

/// Movie list with enriched entries
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMovieListResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub genre_id: i64,
    pub genre_name: String,
    pub owner_id: String,
    pub movies: Vec<EnrichedMovieEntryResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EnrichedMovieList> for EnrichedMovieListResponse {
    fn from(enriched: EnrichedMovieList) -> Self {
        let l = enriched.list;
        Self {
            id: l.id.to_string(),
            name: l.name,
            description: l.description,
            genre_id: l.genre_id,
            genre_name: l.genre_name,
            owner_id: l.owner_id,
            movies: enriched.movies.into_iter().map(Into::into).collect(),
            created_at: timestamp(l.created_at),
            updated_at: timestamp(l.updated_at),
        }
    }
}

/// Page of the caller's lists
#[derive(Debug, Serialize, ToSchema)]
pub struct MovieListPageResponse {
    pub items: Vec<EnrichedMovieListResponse>,
    pub meta: PaginationMeta,
}

/// Movie lists service state
#[derive(Clone)]
pub struct MovieListsState {
    pub service: Arc<MovieListService>,
}

/// Create a movie list
#[utoipa::path(
    post,
    path = "",
    tag = "movie-lists",
    operation_id = "createMovieList",
    request_body = CreateMovieListRequest,
    responses(
        (status = 201, description = "Movie list created", body = MovieListResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Genre not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_movie_list(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<CreateMovieListRequest>,
) -> Result<(StatusCode, Json<MovieListResponse>), ServiceError> {
    let command = CreateMovieListCommand {
        name: req.name,
        description: req.description,
        genre_id: req.genre_id,
        genre_name: req.genre_name,
    };

    let list = state.service.create_list(&auth.0, command).await?;
    Ok((StatusCode::CREATED, Json(list.into())))
}

/// List the caller's movie lists
#[utoipa::path(
    get,
    path = "",
    tag = "movie-lists",
    operation_id = "getMovieLists",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of movie lists", body = MovieListPageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_movie_lists(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<MovieListPageResponse>, ServiceError> {
    let page = state.service.get_user_lists(&auth.0, params).await?;
    Ok(Json(MovieListPageResponse {
        items: page.items.into_iter().map(Into::into).collect(),
        meta: page.meta,
    }))
}

/// Get a movie list with movie details
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "movie-lists",
    operation_id = "getMovieListById",
    params(
        ("id" = String, Path, description = "Movie list ID")
    ),
    responses(
        (status = 200, description = "Movie list found", body = EnrichedMovieListResponse),
        (status = 404, description = "Movie list not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_movie_list(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<EnrichedMovieListResponse>, ServiceError> {
    let id = parse_uuid(&id)?;
    let list = state.service.get_movies_by_list_id(&auth.0, id).await?;
    Ok(Json(list.into()))
}

/// Update name and/or description
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "movie-lists",
    operation_id = "updateMovieList",
    params(
        ("id" = String, Path, description = "Movie list ID")
    ),
    request_body = UpdateMovieListRequest,
    responses(
        (status = 200, description = "Movie list updated", body = MovieListResponse),
        (status = 404, description = "Movie list not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_movie_list(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateMovieListRequest>,
) -> Result<Json<MovieListResponse>, ServiceError> {
    let id = parse_uuid(&id)?;
    let command = UpdateMovieListCommand {
        name: req.name,
        description: req.description,
    };

    let list = state.service.update_list(&auth.0, id, command).await?;
    Ok(Json(list.into()))
}

/// Delete a movie list
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "movie-lists",
    operation_id = "deleteMovieList",
    params(
        ("id" = String, Path, description = "Movie list ID")
    ),
    responses(
        (status = 204, description = "Movie list deleted"),
        (status = 404, description = "Movie list not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_movie_list(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let id = parse_uuid(&id)?;
    state.service.delete_list(&auth.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn membership_command(req: MembershipRequest) -> Result<MembershipCommand, ServiceError> {
    Ok(MembershipCommand {
        list_id: parse_uuid(&req.list_id)?,
        movie_id: req.movie_id,
    })
}

/// Add a movie to a list
#[utoipa::path(
    post,
    path = "/movie",
    tag = "movie-lists",
    operation_id = "addMovieToList",
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Movie added", body = MovieListResponse),
        (status = 404, description = "Movie list not found", body = ErrorResponse),
        (status = 409, description = "Movie already in list", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_movie_to_list(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<MembershipRequest>,
) -> Result<Json<MovieListResponse>, ServiceError> {
    let command = membership_command(req)?;
    let list = state.service.add_movie_to_list(&auth.0, command).await?;
    Ok(Json(list.into()))
}

/// Remove a movie from a list
#[utoipa::path(
    delete,
    path = "/movie",
    tag = "movie-lists",
    operation_id = "removeMovieFromList",
    request_body = MembershipRequest,
    responses(
        (status = 200, description = "Movie removed", body = MovieListResponse),
        (status = 404, description = "List or movie not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_movie_from_list(
    State(state): State<MovieListsState>,
    auth: Authenticated,
    ApiJson(req): ApiJson<MembershipRequest>,
) -> Result<Json<MovieListResponse>, ServiceError> {
    let command = membership_command(req)?;
    let list = state.service.remove_movie_from_list(&auth.0, command).await?;
    Ok(Json(list.into()))
}

/// Create movie lists router
pub fn movie_lists_router(state: MovieListsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_movie_list, list_movie_lists))
        .routes(routes!(add_movie_to_list, remove_movie_from_list))
        .routes(routes!(get_movie_list, update_movie_list, delete_movie_list))
        .with_state(state)
}

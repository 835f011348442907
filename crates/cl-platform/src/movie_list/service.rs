//! Movie List Service
//!
//! Orchestrates the repository, the catalog and the caller's identity.
//! Every operation takes the caller's `UserContext` and only ever touches
//! lists owned by that principal; other owners' lists read as not found.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cl_config::{ListsConfig, MembershipConfig};

use crate::auth::user_context::UserContext;
use crate::catalog::client::MovieCatalog;
use crate::movie_list::enrichment::ListEnricher;
use crate::movie_list::entity::{EnrichedMovieList, MovieList};
use crate::movie_list::repository::MovieListRepository;
use crate::shared::api_common::{Paginated, PaginationMeta, PaginationParams};
use crate::shared::error::{Result, ServiceError};

const LIST_NOT_FOUND: &str = "Movie list not found";
const MAX_NAME_LEN: usize = 255;
const MAX_GENRE_NAME_LEN: usize = 100;
/// Read-modify-write attempts before giving up on a contended list
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Checks applied when adding a movie to a list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipPolicy {
    /// Movie must exist in the catalog
    pub verify_movie_exists: bool,
    /// Movie's genres must include the list's genre
    pub enforce_genre_match: bool,
    /// A movie may appear in a list only once
    pub reject_duplicates: bool,
}

impl MembershipPolicy {
    pub fn strict() -> Self {
        Self {
            verify_movie_exists: true,
            enforce_genre_match: true,
            reject_duplicates: true,
        }
    }

    fn needs_movie_details(&self) -> bool {
        self.verify_movie_exists || self.enforce_genre_match
    }
}

impl From<MembershipConfig> for MembershipPolicy {
    fn from(config: MembershipConfig) -> Self {
        Self {
            verify_movie_exists: config.verify_movie_exists,
            enforce_genre_match: config.enforce_genre_match,
            reject_duplicates: config.reject_duplicates,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateMovieListCommand {
    pub name: String,
    pub description: Option<String>,
    pub genre_id: i64,
    pub genre_name: String,
}

/// Partial update. `description: Some(None)` clears it, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateMovieListCommand {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy)]
pub struct MembershipCommand {
    pub list_id: Uuid,
    pub movie_id: i64,
}

pub struct MovieListService {
    repo: Arc<dyn MovieListRepository>,
    catalog: Arc<dyn MovieCatalog>,
    enricher: ListEnricher,
    policy: MembershipPolicy,
    default_page_size: u32,
    max_page_size: u32,
}

impl MovieListService {
    pub fn new(
        repo: Arc<dyn MovieListRepository>,
        catalog: Arc<dyn MovieCatalog>,
        config: &ListsConfig,
    ) -> Self {
        let enricher = ListEnricher::new(
            catalog.clone(),
            config.enrichment_concurrency,
            Duration::from_millis(config.enrichment_timeout_ms),
        );

        Self {
            repo,
            catalog,
            enricher,
            policy: config.membership.into(),
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
        }
    }

    pub fn with_policy(mut self, policy: MembershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MembershipPolicy {
        self.policy
    }

    pub async fn create_list(&self, ctx: &UserContext, cmd: CreateMovieListCommand) -> Result<MovieList> {
        let name = required_text(&cmd.name, "name", MAX_NAME_LEN)?;
        let genre_name = required_text(&cmd.genre_name, "genreName", MAX_GENRE_NAME_LEN)?;
        if cmd.genre_id <= 0 {
            return Err(ServiceError::validation("genreId must be a positive number"));
        }

        self.catalog.get_genre_by_id(cmd.genre_id).await?;

        let mut list = MovieList::new(ctx.user_id.clone(), name, cmd.genre_id, genre_name);
        list.description = cmd.description;

        self.repo.insert(&list).await?;

        info!(list_id = %list.id, owner_id = %ctx.user_id, genre_id = cmd.genre_id, "Created movie list");
        Ok(list)
    }

    /// Caller's lists, newest first, each enriched with catalog details.
    pub async fn get_user_lists(
        &self,
        ctx: &UserContext,
        params: PaginationParams,
    ) -> Result<Paginated<EnrichedMovieList>> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::validation("page must be a positive integer"));
        }
        let limit = params.limit.unwrap_or(self.default_page_size);
        if limit == 0 {
            return Err(ServiceError::validation("limit must be a positive integer"));
        }
        let limit = limit.min(self.max_page_size);

        let offset = (page as u64 - 1) * limit as u64;
        let (lists, total) = self.repo.find_by_owner(&ctx.user_id, offset, limit).await?;
        let item_count = lists.len() as u32;

        let items = self.enricher.enrich_all(lists).await;

        Ok(Paginated {
            items,
            meta: PaginationMeta::new(total, item_count, limit, page),
        })
    }

    /// One list with enriched entries.
    pub async fn get_movies_by_list_id(&self, ctx: &UserContext, id: Uuid) -> Result<EnrichedMovieList> {
        let list = self.find_owned(ctx, id).await?;
        Ok(self.enricher.enrich(list).await)
    }

    pub async fn add_movie_to_list(&self, ctx: &UserContext, cmd: MembershipCommand) -> Result<MovieList> {
        validate_movie_id(cmd.movie_id)?;
        let list = self.find_owned(ctx, cmd.list_id).await?;
        let policy = self.policy;

        if policy.needs_movie_details() {
            let details = self
                .catalog
                .get_movie_by_id(cmd.movie_id)
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        ServiceError::not_found("Movie not found in TMDB")
                    } else {
                        e
                    }
                })?;

            if policy.enforce_genre_match && !details.has_genre(list.genre_id) {
                return Err(ServiceError::validation(format!(
                    "Movie does not belong to the genre \"{}\"",
                    list.genre_name
                )));
            }
        }

        let movie_id = cmd.movie_id;
        let list = self
            .modify(ctx, list, |list| {
                if policy.reject_duplicates && list.contains_movie(movie_id) {
                    return Err(ServiceError::conflict("Movie is already in this list"));
                }
                list.add_movie(movie_id);
                Ok(())
            })
            .await?;

        info!(list_id = %list.id, movie_id, "Added movie to list");
        Ok(list)
    }

    pub async fn remove_movie_from_list(&self, ctx: &UserContext, cmd: MembershipCommand) -> Result<MovieList> {
        validate_movie_id(cmd.movie_id)?;
        let list = self.find_owned(ctx, cmd.list_id).await?;

        let movie_id = cmd.movie_id;
        let list = self
            .modify(ctx, list, |list| {
                if list.remove_movie(movie_id) == 0 {
                    return Err(ServiceError::not_found("Movie not found in this list"));
                }
                Ok(())
            })
            .await?;

        info!(list_id = %list.id, movie_id, "Removed movie from list");
        Ok(list)
    }

    pub async fn update_list(&self, ctx: &UserContext, id: Uuid, cmd: UpdateMovieListCommand) -> Result<MovieList> {
        let list = self.find_owned(ctx, id).await?;

        // A blank name counts as "not provided"
        let name = cmd
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| required_text(n, "name", MAX_NAME_LEN))
            .transpose()?;

        let list = self
            .modify(ctx, list, |list| {
                if let Some(name) = &name {
                    list.name = name.clone();
                }
                if let Some(description) = &cmd.description {
                    list.description = description.clone();
                }
                list.touch();
                Ok(())
            })
            .await?;

        info!(list_id = %list.id, "Updated movie list");
        Ok(list)
    }

    pub async fn delete_list(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let list = self.find_owned(ctx, id).await?;

        if !self.repo.delete(list.id, &ctx.user_id).await? {
            return Err(ServiceError::not_found(LIST_NOT_FOUND));
        }

        info!(list_id = %id, owner_id = %ctx.user_id, "Deleted movie list");
        Ok(())
    }

    async fn find_owned(&self, ctx: &UserContext, id: Uuid) -> Result<MovieList> {
        self.repo
            .find_by_id_and_owner(id, &ctx.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(LIST_NOT_FOUND))
    }

    /// Apply `change` and persist with a version check, reloading and
    /// reapplying when a concurrent writer wins.
    async fn modify<F>(&self, ctx: &UserContext, list: MovieList, mut change: F) -> Result<MovieList>
    where
        F: FnMut(&mut MovieList) -> Result<()> + Send,
    {
        let id = list.id;
        let mut current = list;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let expected_version = current.version;
            change(&mut current)?;

            if self.repo.update(&current, expected_version).await? {
                current.version = expected_version + 1;
                return Ok(current);
            }

            debug!(list_id = %id, attempt, "Stale list version, reloading");
            current = self.find_owned(ctx, id).await?;
        }

        warn!(list_id = %id, attempts = MAX_WRITE_ATTEMPTS, "Giving up on contended list");
        Err(ServiceError::conflict("Movie list was modified concurrently"))
    }
}

fn required_text(value: &str, field: &str, max_len: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{} should not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(ServiceError::validation(format!(
            "{} must be shorter than or equal to {} characters",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

fn validate_movie_id(movie_id: i64) -> Result<()> {
    if movie_id <= 0 {
        return Err(ServiceError::validation("movieId must be a positive number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Favs ", "name", 10).unwrap(), "Favs");
        assert_eq!(
            required_text("   ", "name", 10).unwrap_err().to_string(),
            "name should not be empty"
        );
        assert!(required_text("abcdefghijk", "name", 10).is_err());
    }

    #[test]
    fn test_policy_from_config() {
        let policy: MembershipPolicy = MembershipConfig {
            verify_movie_exists: true,
            enforce_genre_match: false,
            reject_duplicates: true,
        }
        .into();
        assert!(policy.needs_movie_details());
        assert!(policy.reject_duplicates);
        assert!(!MembershipPolicy::default().needs_movie_details());
    }

    #[test]
    fn test_movie_id_validation() {
        assert!(validate_movie_id(550).is_ok());
        assert!(validate_movie_id(0).is_err());
        assert!(validate_movie_id(-3).is_err());
    }
}

//! Movie List Repository
//!
//! Storage contract for movie lists. Every lookup is scoped to the owner and
//! ignores soft-deleted rows.

use async_trait::async_trait;
use uuid::Uuid;

use crate::movie_list::entity::MovieList;
use crate::shared::error::Result;

pub const TABLE_NAME: &str = "movie_lists";

#[async_trait]
pub trait MovieListRepository: Send + Sync {
    /// Create the table and indexes if missing.
    async fn init_schema(&self) -> Result<()>;

    async fn insert(&self, list: &MovieList) -> Result<()>;

    /// One page of the owner's lists, newest first, plus the owner's total count.
    async fn find_by_owner(&self, owner_id: &str, offset: u64, limit: u32) -> Result<(Vec<MovieList>, u64)>;

    async fn find_by_id_and_owner(&self, id: Uuid, owner_id: &str) -> Result<Option<MovieList>>;

    /// Write name, description, movies and updated_at if the stored version
    /// still equals `expected_version`, bumping it by one.
    ///
    /// Returns `false` when another writer got there first.
    async fn update(&self, list: &MovieList, expected_version: i64) -> Result<bool>;

    /// Returns `false` when nothing matched.
    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<bool>;

    /// Round-trip to the datastore for readiness checks.
    async fn ping(&self) -> Result<()>;
}

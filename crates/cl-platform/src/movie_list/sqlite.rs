//! SQLite Movie List Repository
//!
//! Ids are stored as TEXT, timestamps as epoch milliseconds and the
//! membership array as a JSON TEXT column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::movie_list::entity::{MovieEntry, MovieList};
use crate::movie_list::repository::{MovieListRepository, TABLE_NAME};
use crate::shared::error::{Result, ServiceError};

const COLUMNS: &str =
    "id, name, description, genre_id, genre_name, owner_id, movies, version, created_at, updated_at, deleted_at";

pub struct SqliteMovieListRepository {
    pool: SqlitePool,
}

impl SqliteMovieListRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn parse_timestamp(millis: i64, column: &str) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| ServiceError::internal(format!("Invalid {} timestamp", column)))
    }

    fn parse_row(row: &SqliteRow) -> Result<MovieList> {
        let id: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id).map_err(|_| ServiceError::internal("Invalid stored list id"))?;

        let movies: String = row.try_get("movies")?;
        let movies: Vec<MovieEntry> = serde_json::from_str(&movies)
            .map_err(|e| ServiceError::internal(format!("Invalid stored movies: {}", e)))?;

        let deleted_at: Option<i64> = row.try_get("deleted_at")?;

        Ok(MovieList {
            id,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            genre_id: row.try_get("genre_id")?,
            genre_name: row.try_get("genre_name")?,
            owner_id: row.try_get("owner_id")?,
            movies,
            version: row.try_get("version")?,
            created_at: Self::parse_timestamp(row.try_get("created_at")?, "created_at")?,
            updated_at: Self::parse_timestamp(row.try_get("updated_at")?, "updated_at")?,
            deleted_at: deleted_at
                .map(|ms| Self::parse_timestamp(ms, "deleted_at"))
                .transpose()?,
        })
    }

    fn encode_movies(movies: &[MovieEntry]) -> Result<String> {
        serde_json::to_string(movies)
            .map_err(|e| ServiceError::internal(format!("Failed to encode movies: {}", e)))
    }
}

#[async_trait]
impl MovieListRepository for SqliteMovieListRepository {
    async fn init_schema(&self) -> Result<()> {
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL CHECK (length(name) <= 255),
                    description TEXT,
                    genre_id INTEGER NOT NULL,
                    genre_name TEXT NOT NULL CHECK (length(genre_name) <= 100),
                    owner_id TEXT NOT NULL,
                    movies TEXT NOT NULL DEFAULT '[]',
                    version INTEGER NOT NULL DEFAULT 1,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    deleted_at INTEGER
                )
                "#,
                table = TABLE_NAME
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_{t}_owner_id ON {t}(owner_id)", t = TABLE_NAME),
            format!("CREATE INDEX IF NOT EXISTS idx_{t}_genre_id ON {t}(genre_id)", t = TABLE_NAME),
            format!("CREATE INDEX IF NOT EXISTS idx_{t}_created_at ON {t}(created_at)", t = TABLE_NAME),
        ];

        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        info!(table = TABLE_NAME, "SQLite movie list schema initialized");
        Ok(())
    }

    async fn insert(&self, list: &MovieList) -> Result<()> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TABLE_NAME, COLUMNS
        );

        sqlx::query(&query)
            .bind(list.id.to_string())
            .bind(&list.name)
            .bind(&list.description)
            .bind(list.genre_id)
            .bind(&list.genre_name)
            .bind(&list.owner_id)
            .bind(Self::encode_movies(&list.movies)?)
            .bind(list.version)
            .bind(list.created_at.timestamp_millis())
            .bind(list.updated_at.timestamp_millis())
            .bind(list.deleted_at.map(|d| d.timestamp_millis()))
            .execute(&self.pool)
            .await?;

        debug!(list_id = %list.id, "Inserted movie list");
        Ok(())
    }

    async fn find_by_owner(&self, owner_id: &str, offset: u64, limit: u32) -> Result<(Vec<MovieList>, u64)> {
        let count_query = format!(
            "SELECT COUNT(*) AS total FROM {} WHERE owner_id = ? AND deleted_at IS NULL",
            TABLE_NAME
        );
        let total: i64 = sqlx::query(&count_query)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let query = format!(
            "SELECT {} FROM {} WHERE owner_id = ? AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            COLUMNS, TABLE_NAME
        );
        let rows = sqlx::query(&query)
            .bind(owner_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(Self::parse_row).collect::<Result<Vec<_>>>()?;

        debug!(owner_id = %owner_id, count = items.len(), total, "Fetched movie lists");
        Ok((items, total.max(0) as u64))
    }

    async fn find_by_id_and_owner(&self, id: Uuid, owner_id: &str) -> Result<Option<MovieList>> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = ? AND owner_id = ? AND deleted_at IS NULL",
            COLUMNS, TABLE_NAME
        );

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn update(&self, list: &MovieList, expected_version: i64) -> Result<bool> {
        let query = format!(
            "UPDATE {} SET name = ?, description = ?, movies = ?, updated_at = ?, version = version + 1 \
             WHERE id = ? AND owner_id = ? AND version = ? AND deleted_at IS NULL",
            TABLE_NAME
        );

        let result = sqlx::query(&query)
            .bind(&list.name)
            .bind(&list.description)
            .bind(Self::encode_movies(&list.movies)?)
            .bind(list.updated_at.timestamp_millis())
            .bind(list.id.to_string())
            .bind(&list.owner_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<bool> {
        let query = format!("DELETE FROM {} WHERE id = ? AND owner_id = ?", TABLE_NAME);

        let result = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repo() -> SqliteMovieListRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let repo = SqliteMovieListRepository::new(pool);
        repo.init_schema().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let repo = repo().await;
        let mut list = MovieList::new("owner-a", "Favs", 28, "Action").with_description("desc");
        list.movies.push(MovieEntry::new(550));
        repo.insert(&list).await.unwrap();

        let found = repo.find_by_id_and_owner(list.id, "owner-a").await.unwrap().unwrap();
        assert_eq!(found.name, "Favs");
        assert_eq!(found.description.as_deref(), Some("desc"));
        assert_eq!(found.movies.len(), 1);
        assert_eq!(found.movies[0].movie_id, 550);
        assert_eq!(found.created_at.timestamp_millis(), list.created_at.timestamp_millis());

        assert!(repo.find_by_id_and_owner(list.id, "owner-b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let repo = repo().await;
        let mut list = MovieList::new("owner-a", "Favs", 28, "Action");
        repo.insert(&list).await.unwrap();

        list.name = "Renamed".to_string();
        assert!(repo.update(&list, 1).await.unwrap());
        // Stored version is now 2
        assert!(!repo.update(&list, 1).await.unwrap());

        let found = repo.find_by_id_and_owner(list.id, "owner-a").await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
        assert_eq!(found.version, 2);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_are_invisible() {
        let repo = repo().await;
        let mut list = MovieList::new("owner-a", "Gone", 28, "Action");
        list.deleted_at = Some(Utc::now());
        repo.insert(&list).await.unwrap();

        assert!(repo.find_by_id_and_owner(list.id, "owner-a").await.unwrap().is_none());
        let (items, total) = repo.find_by_owner("owner-a", 0, 10).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let repo = repo().await;
        let list = MovieList::new("owner-a", "Favs", 28, "Action");
        repo.insert(&list).await.unwrap();

        assert!(!repo.delete(list.id, "owner-b").await.unwrap());
        assert!(repo.delete(list.id, "owner-a").await.unwrap());
        assert!(repo.find_by_id_and_owner(list.id, "owner-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_name_length_constraint() {
        let repo = repo().await;
        let list = MovieList::new("owner-a", "x".repeat(300), 28, "Action");
        let err = repo.insert(&list).await.unwrap_err();
        assert!(matches!(err, ServiceError::StorageConstraint { .. }));
    }
}

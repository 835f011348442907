//! PostgreSQL Movie List Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::movie_list::entity::{MovieEntry, MovieList};
use crate::movie_list::repository::{MovieListRepository, TABLE_NAME};
use crate::shared::error::{Result, ServiceError};

const SELECT_COLUMNS: &str = "id, name, description, genre_id, genre_name, owner_id::text AS owner_id, \
     movies::text AS movies, version, created_at, updated_at, deleted_at";

pub struct PostgresMovieListRepository {
    pool: PgPool,
}

impl PostgresMovieListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn parse_row(row: &PgRow) -> Result<MovieList> {
        let movies: String = row.try_get("movies")?;
        let movies: Vec<MovieEntry> = serde_json::from_str(&movies)
            .map_err(|e| ServiceError::internal(format!("Invalid stored movies: {}", e)))?;

        Ok(MovieList {
            id: row.try_get::<Uuid, _>("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            genre_id: row.try_get("genre_id")?,
            genre_name: row.try_get("genre_name")?,
            owner_id: row.try_get("owner_id")?,
            movies,
            version: row.try_get("version")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at")?,
        })
    }

    fn encode_movies(movies: &[MovieEntry]) -> Result<String> {
        serde_json::to_string(movies)
            .map_err(|e| ServiceError::internal(format!("Failed to encode movies: {}", e)))
    }
}

#[async_trait]
impl MovieListRepository for PostgresMovieListRepository {
    async fn init_schema(&self) -> Result<()> {
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    name VARCHAR(255) NOT NULL,
                    description TEXT,
                    genre_id BIGINT NOT NULL,
                    genre_name VARCHAR(100) NOT NULL,
                    owner_id UUID NOT NULL,
                    movies JSONB NOT NULL DEFAULT '[]',
                    version BIGINT NOT NULL DEFAULT 1,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    deleted_at TIMESTAMPTZ
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

        info!(table = TABLE_NAME, "PostgreSQL movie list schema initialized");
        Ok(())
    }

    async fn insert(&self, list: &MovieList) -> Result<()> {
        let query = format!(
            "INSERT INTO {} (id, name, description, genre_id, genre_name, owner_id, movies, version, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6::uuid, $7::jsonb, $8, $9, $10, $11)",
            TABLE_NAME
        );

        sqlx::query(&query)
            .bind(list.id)
            .bind(&list.name)
            .bind(&list.description)
            .bind(list.genre_id)
            .bind(&list.genre_name)
            .bind(&list.owner_id)
            .bind(Self::encode_movies(&list.movies)?)
            .bind(list.version)
            .bind(list.created_at)
            .bind(list.updated_at)
            .bind(list.deleted_at)
            .execute(&self.pool)
            .await?;

        debug!(list_id = %list.id, "Inserted movie list");
        Ok(())
    }

    async fn find_by_owner(&self, owner_id: &str, offset: u64, limit: u32) -> Result<(Vec<MovieList>, u64)> {
        let count_query = format!(
            "SELECT COUNT(*) AS total FROM {} WHERE owner_id = $1::uuid AND deleted_at IS NULL",
            TABLE_NAME
        );
        let total: i64 = sqlx::query(&count_query)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let query = format!(
            "SELECT {} FROM {} WHERE owner_id = $1::uuid AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            SELECT_COLUMNS, TABLE_NAME
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
            "SELECT {} FROM {} WHERE id = $1 AND owner_id = $2::uuid AND deleted_at IS NULL",
            SELECT_COLUMNS, TABLE_NAME
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn update(&self, list: &MovieList, expected_version: i64) -> Result<bool> {
        let query = format!(
            "UPDATE {} SET name = $1, description = $2, movies = $3::jsonb, updated_at = $4, version = version + 1 \
             WHERE id = $5 AND owner_id = $6::uuid AND version = $7 AND deleted_at IS NULL",
            TABLE_NAME
        );

        let result = sqlx::query(&query)
            .bind(&list.name)
            .bind(&list.description)
            .bind(Self::encode_movies(&list.movies)?)
            .bind(list.updated_at)
            .bind(list.id)
            .bind(&list.owner_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1 AND owner_id = $2::uuid", TABLE_NAME);

        let result = sqlx::query(&query)
            .bind(id)
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

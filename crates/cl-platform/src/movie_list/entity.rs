//! Movie List Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::dto::MovieDetails;

/// A movie's membership in a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieEntry {
    pub movie_id: i64,
    pub added_at: DateTime<Utc>,
}

impl MovieEntry {
    pub fn new(movie_id: i64) -> Self {
        Self {
            movie_id,
            added_at: Utc::now(),
        }
    }
}

/// User-owned, genre-tagged list of movies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieList {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub genre_id: i64,
    pub genre_name: String,
    /// Principal that created the list
    pub owner_id: String,
    /// Membership in insertion order
    pub movies: Vec<MovieEntry>,
    /// Optimistic concurrency counter, bumped on every update
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MovieList {
    pub fn new(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        genre_id: i64,
        genre_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            genre_id,
            genre_name: genre_name.into(),
            owner_id: owner_id.into(),
            movies: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn contains_movie(&self, movie_id: i64) -> bool {
        self.movies.iter().any(|m| m.movie_id == movie_id)
    }

    pub fn add_movie(&mut self, movie_id: i64) {
        self.movies.push(MovieEntry::new(movie_id));
        self.touch();
    }

    /// Remove every entry for `movie_id`. Returns how many were removed.
    pub fn remove_movie(&mut self, movie_id: i64) -> usize {
        let before = self.movies.len();
        self.movies.retain(|m| m.movie_id != movie_id);
        let removed = before - self.movies.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Distinct movie ids in first-seen order
    pub fn distinct_movie_ids(&self) -> Vec<i64> {
        let mut seen = std::collections::HashSet::new();
        self.movies
            .iter()
            .map(|m| m.movie_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Membership entry annotated with live catalog data
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMovieEntry {
    pub movie_id: i64,
    pub added_at: DateTime<Utc>,
    /// `None` when the lookup failed
    pub movie_details: Option<MovieDetails>,
}

/// List whose entries carry catalog details
#[derive(Debug, Clone)]
pub struct EnrichedMovieList {
    pub list: MovieList,
    pub movies: Vec<EnrichedMovieEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_list() {
        let list = MovieList::new("user-1", "Action Favs", 28, "Action");
        assert_eq!(list.owner_id, "user-1");
        assert!(list.movies.is_empty());
        assert_eq!(list.version, 1);
        assert!(list.deleted_at.is_none());
        assert_eq!(list.created_at, list.updated_at);
    }

    #[test]
    fn test_remove_filters_all_duplicates() {
        let mut list = MovieList::new("user-1", "Favs", 28, "Action");
        list.add_movie(550);
        list.add_movie(13);
        list.add_movie(550);

        assert_eq!(list.distinct_movie_ids(), vec![550, 13]);
        assert_eq!(list.remove_movie(550), 2);
        assert_eq!(list.movies.len(), 1);
        assert_eq!(list.remove_movie(550), 0);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = MovieEntry::new(550);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["movieId"], 550);
        assert!(json["addedAt"].is_string());
    }
}

//! List Enrichment
//!
//! Annotates membership entries with live catalog details. Lookups for
//! distinct movie ids run concurrently (bounded), each under its own time
//! limit, and each result is kept independently: a failed or slow lookup
//! only nulls its own entries.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::catalog::client::MovieCatalog;
use crate::catalog::dto::MovieDetails;
use crate::movie_list::entity::{EnrichedMovieEntry, EnrichedMovieList, MovieList};

#[derive(Clone)]
pub struct ListEnricher {
    catalog: Arc<dyn MovieCatalog>,
    concurrency: usize,
    lookup_timeout: Duration,
}

impl ListEnricher {
    pub fn new(catalog: Arc<dyn MovieCatalog>, concurrency: usize, lookup_timeout: Duration) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
            lookup_timeout,
        }
    }

    /// Look up every distinct movie once and annotate entries in original order.
    pub async fn enrich_entries(&self, list: &MovieList) -> Vec<EnrichedMovieEntry> {
        let ids = list.distinct_movie_ids();

        let lookups: Vec<(i64, Option<MovieDetails>)> = stream::iter(ids)
            .map(|movie_id| async move {
                let lookup = self.catalog.get_movie_by_id(movie_id);
                match tokio::time::timeout(self.lookup_timeout, lookup).await {
                    Ok(Ok(details)) => (movie_id, Some(details)),
                    Ok(Err(e)) => {
                        debug!(list_id = %list.id, movie_id, error = %e, "Movie lookup failed");
                        (movie_id, None)
                    }
                    Err(_) => {
                        warn!(
                            list_id = %list.id,
                            movie_id,
                            timeout_ms = self.lookup_timeout.as_millis() as u64,
                            "Movie lookup timed out"
                        );
                        (movie_id, None)
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let details: HashMap<i64, Option<MovieDetails>> = lookups.into_iter().collect();

        list.movies
            .iter()
            .map(|entry| EnrichedMovieEntry {
                movie_id: entry.movie_id,
                added_at: entry.added_at,
                movie_details: details.get(&entry.movie_id).cloned().flatten(),
            })
            .collect()
    }

    pub async fn enrich(&self, list: MovieList) -> EnrichedMovieList {
        let movies = self.enrich_entries(&list).await;
        EnrichedMovieList { list, movies }
    }

    /// Enrich several lists concurrently; results keep input order.
    pub async fn enrich_all(&self, lists: Vec<MovieList>) -> Vec<EnrichedMovieList> {
        join_all(lists.into_iter().map(|list| self.enrich(list))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::dto::Genre;
    use crate::shared::error::{Result, ServiceError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCatalog {
        calls: AtomicUsize,
        delay: Duration,
        slow_ids: Vec<i64>,
    }

    impl CountingCatalog {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                slow_ids: Vec::new(),
            }
        }

        /// Only the given ids take `delay`; the rest answer at once.
        fn slow_for(ids: &[i64], delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                slow_ids: ids.to_vec(),
            }
        }
    }

    fn details(id: i64) -> MovieDetails {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Movie {}", id),
            "poster_path": null,
            "backdrop_path": null,
            "runtime": 100,
            "tagline": null,
            "homepage": null
        }))
        .unwrap()
    }

    #[async_trait]
    impl MovieCatalog for CountingCatalog {
        async fn get_genre_by_id(&self, genre_id: i64) -> Result<Genre> {
            Ok(Genre {
                id: genre_id,
                name: "Action".to_string(),
            })
        }

        async fn get_movie_by_id(&self, movie_id: i64) -> Result<MovieDetails> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.slow_ids.is_empty() || self.slow_ids.contains(&movie_id) {
                tokio::time::sleep(self.delay).await;
            }
            if movie_id < 0 {
                return Err(ServiceError::not_found("missing"));
            }
            Ok(details(movie_id))
        }
    }

    fn list_with(ids: &[i64]) -> MovieList {
        let mut list = MovieList::new("owner", "Favs", 28, "Action");
        for id in ids {
            list.add_movie(*id);
        }
        list
    }

    #[tokio::test]
    async fn test_duplicates_share_one_lookup_and_order_is_kept() {
        let catalog = Arc::new(CountingCatalog::new(Duration::ZERO));
        let enricher = ListEnricher::new(catalog.clone(), 4, Duration::from_secs(5));

        let entries = enricher.enrich_entries(&list_with(&[3, 1, 3, 2])).await;

        assert_eq!(catalog.calls.load(Ordering::SeqCst), 3);
        let ids: Vec<i64> = entries.iter().map(|e| e.movie_id).collect();
        assert_eq!(ids, vec![3, 1, 3, 2]);
        assert!(entries.iter().all(|e| e.movie_details.is_some()));
    }

    #[tokio::test]
    async fn test_failed_lookup_only_nulls_its_entries() {
        let catalog = Arc::new(CountingCatalog::new(Duration::ZERO));
        let enricher = ListEnricher::new(catalog, 2, Duration::from_secs(5));

        let entries = enricher.enrich_entries(&list_with(&[550, -1])).await;

        assert_eq!(entries[0].movie_details.as_ref().map(|d| d.id), Some(550));
        assert!(entries[1].movie_details.is_none());
    }

    #[tokio::test]
    async fn test_slow_lookup_only_nulls_its_entries() {
        let catalog = Arc::new(CountingCatalog::slow_for(&[2], Duration::from_millis(400)));
        let enricher = ListEnricher::new(catalog, 8, Duration::from_millis(100));

        let enriched = enricher.enrich(list_with(&[550, 2, 550])).await;

        assert_eq!(enriched.movies.len(), 3);
        assert_eq!(enriched.movies[0].movie_details.as_ref().map(|d| d.id), Some(550));
        assert!(enriched.movies[1].movie_details.is_none());
        assert_eq!(enriched.movies[2].movie_details.as_ref().map(|d| d.id), Some(550));
    }

    #[tokio::test]
    async fn test_every_lookup_slow_keeps_the_list() {
        let catalog = Arc::new(CountingCatalog::new(Duration::from_millis(200)));
        let enricher = ListEnricher::new(catalog, 1, Duration::from_millis(20));

        let enriched = enricher.enrich(list_with(&[1, 2])).await;

        assert_eq!(enriched.movies.len(), 2);
        assert!(enriched.movies.iter().all(|m| m.movie_details.is_none()));
    }

    #[tokio::test]
    async fn test_empty_list_needs_no_lookups() {
        let catalog = Arc::new(CountingCatalog::new(Duration::ZERO));
        let enricher = ListEnricher::new(catalog.clone(), 0, Duration::from_secs(1));

        let lists = enricher.enrich_all(vec![list_with(&[]), list_with(&[])]).await;
        assert_eq!(lists.len(), 2);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
        assert!(lists[0].movies.is_empty());
    }
}

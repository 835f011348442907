//! TMDB Catalog Client Tests
//!
//! Tests for:
//! - api_key and query parameter forwarding
//! - Retry of 5xx answers
//! - 404 mapping for movie details and genres
//! - Upstream status passthrough and schema mismatches

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cl_config::CatalogConfig;
use cl_platform::catalog::dto::{DiscoverMoviesQuery, SearchMoviesQuery};
use cl_platform::catalog::{MovieCatalog, TmdbClient};
use cl_platform::ServiceError;

fn create_client(server: &MockServer, max_retries: u32) -> TmdbClient {
    let config = CatalogConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout_ms: 2000,
        max_retries,
    };
    TmdbClient::new(&config).unwrap()
}

fn movie_page() -> serde_json::Value {
    json!({
        "page": 1,
        "results": [
            {"id": 550, "title": "Fight Club", "poster_path": null, "backdrop_path": null, "genre_ids": [18]}
        ],
        "total_pages": 1,
        "total_results": 1
    })
}

fn genres() -> serde_json::Value {
    json!({"genres": [{"id": 28, "name": "Action"}, {"id": 18, "name": "Drama"}]})
}

#[tokio::test]
async fn test_search_forwards_api_key_and_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("query", "fight club"))
        .and(query_param("page", "1"))
        .and(query_param("include_adult", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 0);
    let query = SearchMoviesQuery {
        query: Some("  fight club ".to_string()),
        ..Default::default()
    };

    let page = client.search_movies(&query).await.unwrap();
    assert_eq!(page.total_results, 1);
    assert_eq!(page.results[0].title, "Fight Club");
}

#[tokio::test]
async fn test_blank_search_query_is_rejected_locally() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_page()))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_client(&server, 0);
    let query = SearchMoviesQuery {
        query: Some("   ".to_string()),
        ..Default::default()
    };

    let err = client.search_movies(&query).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }));
    assert_eq!(err.to_string(), "Search query is required");
}

#[tokio::test]
async fn test_discover_maps_year_to_primary_release_year() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("primary_release_year", "1999"))
        .and(query_param("with_genres", "28,12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 0);
    let query = DiscoverMoviesQuery {
        year: Some(1999),
        with_genres: Some("28,12".to_string()),
        ..Default::default()
    };

    assert!(client.discover_movies(&query).await.is_ok());
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 1);
    let page = client.get_popular_movies(2).await.unwrap();
    assert_eq!(page.results.len(), 1);
}

#[tokio::test]
async fn test_persistent_server_error_keeps_upstream_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie/now_playing"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_client(&server, 1);
    let err = client.get_now_playing_movies(1).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.to_string(), "Error fetching now playing movies");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"status_message": "Invalid API key"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 3);
    let err = client.get_genres().await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Error fetching genres");
}

#[tokio::test]
async fn test_movie_details_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie/999999"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 1);
    let err = client.get_movie_by_id(999999).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Movie with id 999999 not found");
}

#[tokio::test]
async fn test_movie_details_with_genres() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie/550"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": null,
            "backdrop_path": null,
            "runtime": 139,
            "genres": [{"id": 18, "name": "Drama"}],
            "tagline": null,
            "homepage": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 0);
    let details = client.get_movie_by_id(550).await.unwrap();
    assert_eq!(details.runtime, Some(139));
    assert!(details.has_genre(18));
    assert!(!details.has_genre(28));
}

#[tokio::test]
async fn test_unexpected_body_is_bad_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, 0);
    let err = client.get_genres().await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_genre_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(genres()))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_client(&server, 0);

    let genre = client.get_genre_by_id(28).await.unwrap();
    assert_eq!(genre.name, "Action");

    let err = client.get_genre_by_id(12345).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Genre with id 12345 not found");
}

#[tokio::test]
async fn test_unreachable_catalog_is_client_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let config = CatalogConfig {
        base_url: uri,
        api_key: "test-key".to_string(),
        timeout_ms: 500,
        max_retries: 0,
    };
    let client = TmdbClient::new(&config).unwrap();

    let err = client.get_genres().await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

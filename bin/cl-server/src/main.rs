//! CineList Server
//!
//! Production server for the movie-list backend:
//! - Auth APIs: login, signup, logout (proxied to the identity provider)
//! - Movie APIs: catalog passthrough
//! - Movie list APIs: owned, genre-scoped lists
//! - Monitoring: /health, /ready
//!
//! ## Configuration
//!
//! Read from `CINELIST_CONFIG` or `config.toml`, then overridden by the
//! environment (`CINELIST_*`, plus `PORT`, `DATABASE_URL`, `SUPABASE_URL`,
//! `SUPABASE_KEY`, `SUPABASE_JWT_SECRET`, `TMDB_API_KEY`). `RUST_LOG`
//! sets the log level and `LOG_FORMAT=json` switches to JSON logs.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use cl_config::{AppConfig, ConfigLoader, DatabaseConfig, HttpConfig};
use cl_platform::api::{
    auth_router, health_router, movie_lists_router, movies_router, AppState, AuthLayer,
    AuthState, HealthState, MovieListsState, MoviesState,
};
use cl_platform::auth::{IdentityProvider, SupabaseGateway, TokenVerifier};
use cl_platform::catalog::{MovieCatalog, TmdbClient};
use cl_platform::movie_list::{
    MovieListRepository, MovieListService, PostgresMovieListRepository,
    SqliteMovieListRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    cl_common::logging::init_logging("cl-server");

    info!("Starting CineList Server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    let repo = connect_repository(&config.database).await?;
    if config.database.init_schema {
        repo.init_schema().await?;
    }
    info!("Repository initialized");

    let catalog = Arc::new(TmdbClient::new(&config.catalog)?);
    let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseGateway::new(&config.identity)?);
    let token_verifier = Arc::new(TokenVerifier::from_config(&config.identity));

    let list_catalog: Arc<dyn MovieCatalog> = catalog.clone();
    let list_service = Arc::new(MovieListService::new(repo.clone(), list_catalog, &config.lists));
    info!(policy = ?list_service.policy(), "Movie list service initialized");

    let app_state = AppState { token_verifier };

    let app = build_app(&config, app_state, repo, catalog, identity, list_service);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("CineList Server shutdown complete");
    Ok(())
}

async fn connect_repository(config: &DatabaseConfig) -> Result<Arc<dyn MovieListRepository>> {
    if config.is_sqlite() {
        info!("Connecting to SQLite: {}", config.url);
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        // Every connection to an in-memory database is a separate database
        let max_connections = if config.url.contains(":memory:") { 1 } else { config.max_connections };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;
        Ok(Arc::new(SqliteMovieListRepository::new(pool)))
    } else {
        info!("Connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.url)
            .await?;
        Ok(Arc::new(PostgresMovieListRepository::new(pool)))
    }
}

fn build_app(
    config: &AppConfig,
    app_state: AppState,
    repo: Arc<dyn MovieListRepository>,
    catalog: Arc<TmdbClient>,
    identity: Arc<dyn IdentityProvider>,
    list_service: Arc<MovieListService>,
) -> Router {
    let health_state = HealthState::new(repo, env!("CARGO_PKG_VERSION"));
    let auth_state = AuthState { identity };
    let movies_state = MoviesState { catalog };
    let movie_lists_state = MovieListsState { service: list_service };

    let api = OpenApiRouter::new()
        .nest("/auth", auth_router(auth_state))
        .nest("/movies", movies_router(movies_state))
        .nest("/movie-lists", movie_lists_router(movie_lists_state));

    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/v1", api)
        .merge(health_router(health_state))
        .split_for_parts();

    openapi.info.title = "CineList API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Movie lists backed by a movie catalog".to_string());
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    Router::new()
        .merge(router)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http))
}

fn cors_layer(config: &HttpConfig) -> CorsLayer {
    let origins = if config.cors_origins.iter().any(|o| o == "*") {
        // Credentials forbid a literal wildcard
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}

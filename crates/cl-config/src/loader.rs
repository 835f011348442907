//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "cinelist.toml",
    "./config/config.toml",
    "./config/cinelist.toml",
    "/etc/cinelist/config.toml",
];

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, |key| env::var(key).ok())?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured config file does not exist");
        }

        if let Ok(path) = env::var("CINELIST_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

/// First variable in `keys` that is set and non-empty.
fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
}

fn parse_var<F, T>(lookup: &F, keys: &[&str]) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match first_set(lookup, keys) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvError(format!("{} has an invalid value: {}", keys[0], raw))),
        None => Ok(None),
    }
}

/// Apply environment overrides using `lookup` to read variables.
///
/// `CINELIST_*` names take precedence over the legacy deployment names
/// (`PORT`, `DATABASE_URL`, `SUPABASE_*`, `TMDB_API_KEY`).
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = parse_var(&lookup, &["CINELIST_HTTP_PORT", "PORT"])? {
        config.http.port = port;
    }
    if let Some(host) = first_set(&lookup, &["CINELIST_HTTP_HOST"]) {
        config.http.host = host;
    }
    if let Some(origins) = first_set(&lookup, &["CINELIST_CORS_ORIGINS"]) {
        config.http.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
    }

    // Database
    if let Some(url) = first_set(&lookup, &["CINELIST_DATABASE_URL", "DATABASE_URL"]) {
        config.database.url = url;
    }
    if let Some(max) = parse_var(&lookup, &["CINELIST_DATABASE_MAX_CONNECTIONS"])? {
        config.database.max_connections = max;
    }
    if let Some(init) = parse_var(&lookup, &["CINELIST_DATABASE_INIT_SCHEMA"])? {
        config.database.init_schema = init;
    }

    // Identity provider
    if let Some(url) = first_set(&lookup, &["CINELIST_IDENTITY_URL", "SUPABASE_URL"]) {
        config.identity.url = url;
    }
    if let Some(key) = first_set(&lookup, &["CINELIST_IDENTITY_API_KEY", "SUPABASE_KEY"]) {
        config.identity.api_key = key;
    }
    if let Some(secret) = first_set(&lookup, &["CINELIST_IDENTITY_JWT_SECRET", "SUPABASE_JWT_SECRET"]) {
        config.identity.jwt_secret = secret;
    }
    if let Some(aud) = first_set(&lookup, &["CINELIST_IDENTITY_JWT_AUDIENCE"]) {
        config.identity.jwt_audience = aud;
    }

    // Catalog
    if let Some(url) = first_set(&lookup, &["CINELIST_CATALOG_BASE_URL"]) {
        config.catalog.base_url = url;
    }
    if let Some(key) = first_set(&lookup, &["CINELIST_CATALOG_API_KEY", "TMDB_API_KEY", "TMBD_API_KEY"]) {
        config.catalog.api_key = key;
    }
    if let Some(timeout) = parse_var(&lookup, &["CINELIST_CATALOG_TIMEOUT_MS"])? {
        config.catalog.timeout_ms = timeout;
    }
    if let Some(retries) = parse_var(&lookup, &["CINELIST_CATALOG_MAX_RETRIES"])? {
        config.catalog.max_retries = retries;
    }

    // Lists
    if let Some(size) = parse_var(&lookup, &["CINELIST_LISTS_DEFAULT_PAGE_SIZE"])? {
        config.lists.default_page_size = size;
    }
    if let Some(size) = parse_var(&lookup, &["CINELIST_LISTS_MAX_PAGE_SIZE"])? {
        config.lists.max_page_size = size;
    }
    if let Some(n) = parse_var(&lookup, &["CINELIST_LISTS_ENRICHMENT_CONCURRENCY"])? {
        config.lists.enrichment_concurrency = n;
    }
    if let Some(ms) = parse_var(&lookup, &["CINELIST_LISTS_ENRICHMENT_TIMEOUT_MS"])? {
        config.lists.enrichment_timeout_ms = ms;
    }
    if let Some(flag) = parse_var(&lookup, &["CINELIST_LISTS_VERIFY_MOVIE_EXISTS"])? {
        config.lists.membership.verify_movie_exists = flag;
    }
    if let Some(flag) = parse_var(&lookup, &["CINELIST_LISTS_ENFORCE_GENRE_MATCH"])? {
        config.lists.membership.enforce_genre_match = flag;
    }
    if let Some(flag) = parse_var(&lookup, &["CINELIST_LISTS_REJECT_DUPLICATES"])? {
        config.lists.membership.reject_duplicates = flag;
    }

    Ok(())
}

//! Structured Logging Configuration
//!
//! - JSON output for production (`LOG_FORMAT=json`)
//! - Human-readable output for development (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use cl_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("cl-server");
//!     tracing::info!(list_id = %id, "Created movie list");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" for JSON output, anything else for text (default: text)
//! - `RUST_LOG`: standard filter directives (default: info)
//!   e.g. `RUST_LOG=cl_platform=debug,tower_http=info`

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format selected from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Initialize logging for the given service.
///
/// Calling this twice in one process is a no-op for the second call.
pub fn init_logging(service_name: &str) {
    let format = LogFormat::from_env_value(&std::env::var("LOG_FORMAT").unwrap_or_default());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    }

    tracing::debug!(service = %service_name, ?format, "Logging initialized");
}

fn init_json_logging(env_filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(false)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE)
        )
        .try_init();
}

fn init_text_logging(env_filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true)
        )
        .try_init();
}

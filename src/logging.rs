//! # Structured Logging Module
//!
//! Environment-aware structured logging for the dispatcher client and the
//! `hatchet-listen` worker binary.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` wins when set; otherwise the level follows the environment.
/// Set `HATCHET_LOG_FORMAT=json` for JSON lines. Safe to call more than once.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = is_json_format(std::env::var("HATCHET_LOG_FORMAT").ok().as_deref());

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Use try_init to avoid panic if a global subscriber is already set
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("HATCHET_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Whether `HATCHET_LOG_FORMAT` selects JSON lines
fn is_json_format(format: Option<&str>) -> bool {
    format.is_some_and(|format| format.trim().eq_ignore_ascii_case("json"))
}

/// Log a listener state transition
pub fn log_listener_transition(
    listener_id: &uuid::Uuid,
    worker_id: &str,
    from: &str,
    to: &str,
    reason: Option<&str>,
) {
    tracing::info!(
        listener_id = %listener_id,
        worker_id = %worker_id,
        from = %from,
        to = %to,
        reason = reason,
        "LISTENER_TRANSITION"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_log_format_selection() {
        assert!(is_json_format(Some("json")));
        assert!(is_json_format(Some("JSON")));
        assert!(is_json_format(Some(" json ")));
        assert!(!is_json_format(Some("pretty")));
        assert!(!is_json_format(Some("")));
        assert!(!is_json_format(None));
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}

//! Logging utilities for the Zero screener.
//!
//! Provides pretty or structured JSON logging and the session identifiers
//! used to tell independent editing sessions apart in the log stream.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log formats accepted by [`init_logging`].
pub const LOG_FORMATS: &[&str] = &["json", "pretty"];

/// Log levels accepted by [`init_logging`].
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Level filter: `RUST_LOG` when set, otherwise `log_level`.
fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Install the global subscriber, writing to stderr.
///
/// `log_format` is `"json"` for one JSON object per line (session spans are
/// reported on close) or anything else for human-readable output. Calling it
/// again after a subscriber is installed does nothing.
pub fn init_logging(log_level: &str, log_format: &str) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::debug!(log_level, log_format, "Logging initialized");
}

/// Generate a new identifier for an editing session.
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a short identifier, e.g. for a condition row.
pub fn generate_short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Create a tracing span for one editing session.
///
/// # Example
///
/// ```ignore
/// let span = session_span!(session_id, mode = "structured");
/// let _enter = span.enter();
/// ```
#[macro_export]
macro_rules! session_span {
    ($session_id:expr) => {
        tracing::debug_span!("filter_session", session_id = %$session_id)
    };
    ($session_id:expr, $($field:tt)*) => {
        tracing::debug_span!("filter_session", session_id = %$session_id, $($field)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_constants() {
        assert!(LOG_FORMATS.contains(&"json"));
        assert!(LOG_FORMATS.contains(&"pretty"));
        assert_eq!(LOG_LEVELS.len(), 5);
    }

    #[test]
    fn test_generate_session_id() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36); // UUID format
    }

    #[test]
    fn test_generate_short_id() {
        let id = generate_short_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging("info", "pretty");
        init_logging("debug", "json");
    }
}

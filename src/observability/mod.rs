//! Observability subsystem
//!
//! Structured logging on top of `tracing`, plus the typed lifecycle events
//! written through [`log_event`] and [`log_event_with_fields`].
//!
//! # Usage
//!
//! ```ignore
//! use happiness_api::observability::{init_logging, log_event_with_fields, Event, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! log_event_with_fields(Event::SeedLoaded, &[("documents", "158")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{init_logging, LogConfig};

use thiserror::Error;
use tracing::Level;

/// Observability errors.
///
/// These never abort a request; only boot reports them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservabilityError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Failed to install log subscriber: {0}")]
    InitFailed(String),
}

impl ObservabilityError {
    pub fn code(&self) -> &'static str {
        match self {
            ObservabilityError::InvalidLevel(_) => "OBSERVABILITY_INVALID_LEVEL",
            ObservabilityError::InitFailed(_) => "OBSERVABILITY_INIT_FAILED",
        }
    }
}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields.
///
/// Fields are rendered as `key=value` pairs in the given order.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let fields = render_fields(fields);
    let name = event.as_str();

    match event.level() {
        Level::ERROR => tracing::error!(event = name, %fields),
        Level::WARN => tracing::warn!(event = name, %fields),
        Level::INFO => tracing::info!(event = name, %fields),
        Level::DEBUG => tracing::debug!(event = name, %fields),
        _ => tracing::trace!(event = name, %fields),
    }
}

fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ObservabilityError::InitFailed("already set".to_string());
        assert_eq!(err.code(), "OBSERVABILITY_INIT_FAILED");
        assert!(err.to_string().contains("already set"));
    }

    #[test]
    fn test_render_fields() {
        assert_eq!(render_fields(&[]), "");
        assert_eq!(
            render_fields(&[("collection", "countries"), ("documents", "3")]),
            "collection=countries documents=3"
        );
    }

    #[test]
    fn test_log_event() {
        // No subscriber installed; must not panic
        log_event(Event::BootStart);
        log_event_with_fields(Event::QueryRejected, &[("reason", "bad filter")]);
    }
}

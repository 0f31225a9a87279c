//! Lifecycle events of the service
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` field of every log line.

use std::fmt;

use tracing::Level;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Seed documents inserted into the collection
    SeedLoaded,
    /// HTTP listener bound, ready for requests
    Serving,
    /// Listener stopped
    ShutdownComplete,

    // Writes
    CountryInserted,
    CountryUpdated,
    CountryDeleted,

    // Queries
    /// Query helper returned a result
    QueryExecuted,
    /// Query refused before or by the collection
    QueryRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "HAPPINESS_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SeedLoaded => "SEED_LOADED",
            Event::Serving => "HAPPINESS_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::CountryInserted => "COUNTRY_INSERTED",
            Event::CountryUpdated => "COUNTRY_UPDATED",
            Event::CountryDeleted => "COUNTRY_DELETED",

            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::QueryRejected => Level::WARN,
            Event::QueryExecuted => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

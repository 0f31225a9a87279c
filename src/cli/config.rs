//! Configuration file
//!
//! ```json
//! {
//!   "collection": "countries",
//!   "seed_file": "data/world_happiness_2015.json",
//!   "http": {"host": "0.0.0.0", "port": 8000, "cors_origins": []},
//!   "log": {"level": "info", "json": false}
//! }
//! ```
//!
//! Every field is optional. A missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::LogConfig;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the document collection
    pub collection: String,

    /// JSON array of country payloads inserted at boot.
    ///
    /// A relative path is resolved against the configuration file's
    /// directory.
    pub seed_file: Option<PathBuf>,

    pub http: HttpServerConfig,

    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection: "countries".to_string(),
            seed_file: None,
            http: HttpServerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        if let (Some(seed), Some(dir)) = (&config.seed_file, path.parent()) {
            if seed.is_relative() {
                config.seed_file = Some(dir.join(seed));
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> CliResult<()> {
        if self.collection.trim().is_empty() {
            return Err(CliError::config_error("collection must not be empty"));
        }

        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        Ok(())
    }
}

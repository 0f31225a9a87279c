//! CLI command implementations
//!
//! Both commands share one boot sequence:
//! 1. Configuration load
//! 2. Logging setup
//! 3. Collection creation and seeding
//!
//! `serve` then starts the HTTP server; `query` runs one pass-through
//! request. Pass-through requests accept arbitrary query expressions and are
//! only reachable from here, never over HTTP.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::countries::{Country, CountryQueries};
use crate::http_server::HttpServer;
use crate::observability::{init_logging, log_event, log_event_with_fields, Event};
use crate::store::InMemoryCollection;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query { config } => query(&config),
    }
}

/// Boot and serve HTTP until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = boot_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
        config.validate()?;
    }

    let queries = boot_collection(&config)?;
    let server = HttpServer::with_config(config.http.clone(), queries);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Execute a single pass-through request from stdin and exit
///
/// Input: `{"op": "find" | "aggregate" | "distinct", "args": [...]}`.
/// For `aggregate`, `args` is the pipeline; otherwise it holds the parts.
pub fn query(config_path: &Path) -> CliResult<()> {
    let config = boot_config(config_path)?;
    let queries = boot_collection(&config)?;

    let request = read_request()?;
    match execute_request(&queries, &request) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Dispatch one pass-through request to its helper
pub fn execute_request(queries: &CountryQueries, request: &Value) -> CliResult<Value> {
    let op = request
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| CliError::query_failed("request needs a string 'op'"))?;
    let args = request
        .get("args")
        .and_then(Value::as_array)
        .ok_or_else(|| CliError::query_failed("request needs an array 'args'"))?;

    let table = match op {
        "find" => queries.find_request(args),
        "aggregate" => queries.aggregation_request(&Value::Array(args.clone())),
        "distinct" => queries.distinct_request(args),
        other => return Err(CliError::query_failed(format!("unknown op '{}'", other))),
    }
    .map_err(|e| CliError::query_failed(e.to_string()))?;

    Ok(serde_json::to_value(table)?)
}

fn boot_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    // A subscriber may already be installed when embedded in tests
    if let Err(e) = init_logging(&config.log) {
        eprintln!("{}: {}", e.code(), e);
    }

    log_event(Event::BootStart);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("path", &config_path.display().to_string()),
            ("collection", &config.collection),
        ],
    );
    Ok(config)
}

/// Create the collection and insert the seed documents, if any
pub fn boot_collection(config: &Config) -> CliResult<CountryQueries> {
    let collection = Arc::new(InMemoryCollection::new(config.collection.clone()));
    let queries = CountryQueries::new(collection);

    if let Some(seed_path) = &config.seed_file {
        let countries = load_seed(seed_path)?;
        for country in &countries {
            queries
                .insert_country(country)
                .map_err(|e| CliError::seed_error(format!("{}: {}", country.country, e)))?;
        }
        log_event_with_fields(
            Event::SeedLoaded,
            &[
                ("path", &seed_path.display().to_string()),
                ("documents", &countries.len().to_string()),
            ],
        );
    }

    Ok(queries)
}

fn load_seed(path: &Path) -> CliResult<Vec<Country>> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::seed_error(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::seed_error(format!("Invalid seed file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn seed(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("seed.json");
        let rows: Vec<Value> = [("A", 3.0), ("B", 5.0), ("C", 7.0)]
            .iter()
            .map(|(name, score)| {
                json!({
                    "country": name, "Region": "North", "Happiness_Rank": 1,
                    "Happiness_Score": score, "Standard_Error": 0.03,
                    "Economy_GDP_per_Capita": 1.2, "Family": 1.1,
                    "Health_Life_Expectancy": 0.9, "Freedom": 0.6,
                    "Trust_Government_Corruption": 0.3, "Generosity": 0.2,
                    "Dystopia_Residual": 2.0
                })
            })
            .collect();
        fs::write(&path, serde_json::to_string(&rows).unwrap()).unwrap();
        path
    }

    fn seeded_queries(dir: &TempDir) -> CountryQueries {
        let config = Config {
            seed_file: Some(seed(dir)),
            ..Default::default()
        };
        boot_collection(&config).unwrap()
    }

    #[test]
    fn test_boot_collection_loads_seed() {
        let dir = TempDir::new().unwrap();
        let queries = seeded_queries(&dir);
        assert_eq!(queries.collection().count_documents(&json!({})).unwrap(), 3);
        assert_eq!(queries.collection().name(), "countries");
    }

    #[test]
    fn test_boot_collection_rejects_bad_seed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seed.json");
        fs::write(&path, r#"[{"country": "A"}]"#).unwrap();

        let config = Config {
            seed_file: Some(path),
            ..Default::default()
        };
        let err = boot_collection(&config).err().unwrap();
        assert_eq!(err.code_str(), "HAPPINESS_CLI_SEED_ERROR");
    }

    #[test]
    fn test_execute_find() {
        let dir = TempDir::new().unwrap();
        let queries = seeded_queries(&dir);
        let request = json!({
            "op": "find",
            "args": [{"Happiness_Score": {"$gt": 4}}, {"country": 1, "_id": 0}]
        });
        let data = execute_request(&queries, &request).unwrap();
        assert_eq!(data, json!([{"country": "B"}, {"country": "C"}]));
    }

    #[test]
    fn test_execute_aggregate() {
        let dir = TempDir::new().unwrap();
        let queries = seeded_queries(&dir);
        let request = json!({
            "op": "aggregate",
            "args": [{"$group": {"_id": "$Region", "n": {"$sum": 1}}}]
        });
        let data = execute_request(&queries, &request).unwrap();
        assert_eq!(data, json!([{"_id": "North", "n": 3}]));
    }

    #[test]
    fn test_execute_distinct() {
        let dir = TempDir::new().unwrap();
        let queries = seeded_queries(&dir);
        let request = json!({"op": "distinct", "args": ["Region"]});
        let data = execute_request(&queries, &request).unwrap();
        assert_eq!(data, json!([{"0": "North"}]));
    }

    #[test]
    fn test_execute_rejects_malformed_requests() {
        let dir = TempDir::new().unwrap();
        let queries = seeded_queries(&dir);

        for request in [
            json!({"args": []}),
            json!({"op": "find"}),
            json!({"op": "drop", "args": []}),
            json!({"op": "find", "args": []}),
            json!({"op": "find", "args": [{"a": {"$bogus": 1}}]}),
        ] {
            let err = execute_request(&queries, &request).unwrap_err();
            assert_eq!(err.code_str(), "HAPPINESS_CLI_QUERY_FAILED", "{}", request);
        }
    }
}

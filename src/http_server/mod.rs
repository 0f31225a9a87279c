//! # HTTP Server Module
//!
//! Axum server exposing the countries API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/insert_country/`, `/update_country/{id}`, `/delete_country/{id}` - Writes
//! - `/countries_info/`, `/country/{name}`, ... - Lookups and statistics

pub mod config;
pub mod country_routes;
pub mod errors;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::{build_router, HttpServer};

//! happiness-api - CRUD HTTP service over a world happiness index
//!
//! - [`store`]: document collection trait and its in-memory implementation
//! - [`countries`]: country model, record shaper and query helpers
//! - [`http_server`]: axum routes over the query helpers
//! - [`observability`]: logging setup and lifecycle events
//! - [`cli`]: `serve` and `query` commands

pub mod cli;
pub mod countries;
pub mod http_server;
pub mod observability;
pub mod store;

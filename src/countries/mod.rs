//! # Countries
//!
//! Domain layer of the service: the country record, the shaper that turns
//! stored documents into API records, and the query helpers.

pub mod errors;
pub mod model;
pub mod queries;
pub mod shaper;
pub mod table;

pub use errors::{CountryError, CountryResult};
pub use model::{validate_patch, Country, COUNTRY_FIELDS, NUMERIC_FIELDS};
pub use queries::CountryQueries;
pub use shaper::{countries_entity, country_entity, serialize_document, serialize_documents, stringify_id};
pub use table::Table;

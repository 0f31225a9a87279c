//! # Document Collection
//!
//! The storage collaborator of the service: a named group of schemaless
//! JSON documents addressed through Mongo-style filters, updates and
//! aggregation pipelines.
//!
//! [`DocumentCollection`] is the seam the query helpers are written
//! against; [`InMemoryCollection`] is the implementation the server and the
//! tests run on.

pub mod errors;
pub mod filter;
pub mod memory;
pub mod object_id;
pub mod pipeline;
pub mod projection;
pub mod sort;
pub mod update;
pub mod value;

use serde_json::{Map, Value};

pub use errors::{StoreError, StoreResult};
pub use filter::{Filter, FilterOp};
pub use memory::InMemoryCollection;
pub use object_id::ObjectId;
pub use pipeline::Pipeline;
pub use projection::Projection;
pub use sort::{SortDirection, SortSpec};
pub use update::Update;

/// One stored record
pub type Document = Map<String, Value>;

/// Options for `find` and `find_one`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Inclusion or exclusion projection document
    pub projection: Option<Value>,

    /// Sort specification (`{"field": 1}` or `[["field", -1]]`)
    pub sort: Option<Value>,

    /// Maximum number of documents returned
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(mut self, projection: Value) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Operations the service needs from a document collection.
///
/// Filters, updates and pipelines are passed as raw JSON and interpreted by
/// the implementation; malformed expressions surface as [`StoreError`].
pub trait DocumentCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Insert a document, assigning an `_id` when it has none.
    ///
    /// Returns the `_id` value of the stored document.
    fn insert_one(&self, document: Document) -> StoreResult<Value>;

    /// All matching documents, in natural order unless sorted
    fn find(&self, filter: &Value, options: &FindOptions) -> StoreResult<Vec<Document>>;

    /// First matching document
    fn find_one(&self, filter: &Value, options: &FindOptions) -> StoreResult<Option<Document>> {
        let options = options.clone().limit(1);
        Ok(self.find(filter, &options)?.into_iter().next())
    }

    /// Apply an update to the first matching document.
    ///
    /// Returns the document as it was before the update.
    fn find_one_and_update(&self, filter: &Value, update: &Value)
        -> StoreResult<Option<Document>>;

    /// Delete the first matching document, returning the number deleted
    fn delete_one(&self, filter: &Value) -> StoreResult<u64>;

    /// Number of matching documents
    fn count_documents(&self, filter: &Value) -> StoreResult<u64>;

    /// Run an aggregation pipeline over the whole collection
    fn aggregate(&self, pipeline: &Value) -> StoreResult<Vec<Document>>;

    /// Distinct values of a field among matching documents
    fn distinct(
        &self,
        field: &str,
        filter: Option<&Value>,
        options: Option<&Value>,
    ) -> StoreResult<Vec<Value>>;
}

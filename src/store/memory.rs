//! In-memory document collection
//!
//! Documents live in insertion order behind an `RwLock`; that order is the
//! natural order used when no sort is given.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filter::Filter;
use super::object_id::ObjectId;
use super::pipeline::Pipeline;
use super::projection::Projection;
use super::sort::{sort_documents, SortSpec};
use super::update::Update;
use super::value::{get_path, values_equal};
use super::{Document, DocumentCollection, FindOptions};

/// Collection held entirely in process memory
#[derive(Debug)]
pub struct InMemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
}

impl InMemoryCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<Document>>> {
        self.documents
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Vec<Document>>> {
        self.documents
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".to_string()))
    }
}

impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert_one(&self, mut document: Document) -> StoreResult<Value> {
        let existing = document.get("_id").cloned();
        let id = match existing {
            Some(Value::Null) | None => {
                let id = ObjectId::new().to_json();
                // Keep `_id` as the first field, as the storage engine does
                let mut with_id = Document::new();
                with_id.insert("_id".to_string(), id.clone());
                with_id.extend(document.into_iter().filter(|(k, _)| k != "_id"));
                document = with_id;
                id
            }
            Some(Value::Array(_)) => {
                return Err(StoreError::InvalidDocument(
                    "can't use an array for _id".to_string(),
                ))
            }
            Some(id) => id,
        };

        let mut store = self.write()?;
        if store
            .iter()
            .any(|d| d.get("_id").is_some_and(|existing| values_equal(existing, &id)))
        {
            return Err(StoreError::DuplicateKey(format!("_id: {}", id)));
        }
        store.push(document);

        Ok(id)
    }

    fn find(&self, filter: &Value, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let filter = Filter::parse(filter)?;
        let projection = match &options.projection {
            Some(p) => Projection::parse(p)?,
            None => None,
        };
        let sort = match &options.sort {
            Some(s) => SortSpec::parse_list(s)?,
            None => Vec::new(),
        };

        let store = self.read()?;
        let mut matched: Vec<Document> = store.iter().filter(|d| filter.matches(d)).cloned().collect();
        drop(store);

        sort_documents(&mut matched, &sort);
        if let Some(limit) = options.limit {
            matched.truncate(limit);
        }

        Ok(match projection {
            Some(projection) => matched.into_iter().map(|d| projection.apply(d)).collect(),
            None => matched,
        })
    }

    fn find_one_and_update(
        &self,
        filter: &Value,
        update: &Value,
    ) -> StoreResult<Option<Document>> {
        let filter = Filter::parse(filter)?;
        let update = Update::parse(update)?;

        let mut store = self.write()?;
        let Some(target) = store.iter_mut().find(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let before = target.clone();
        let mut after = before.clone();
        update.apply(&mut after)?;
        *target = after;

        Ok(Some(before))
    }

    fn delete_one(&self, filter: &Value) -> StoreResult<u64> {
        let filter = Filter::parse(filter)?;

        let mut store = self.write()?;
        match store.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                store.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn count_documents(&self, filter: &Value) -> StoreResult<u64> {
        let filter = Filter::parse(filter)?;
        let store = self.read()?;
        Ok(store.iter().filter(|d| filter.matches(d)).count() as u64)
    }

    fn aggregate(&self, pipeline: &Value) -> StoreResult<Vec<Document>> {
        let pipeline = Pipeline::parse(pipeline)?;
        let snapshot = self.read()?.clone();
        Ok(pipeline.run(snapshot))
    }

    fn distinct(
        &self,
        field: &str,
        filter: Option<&Value>,
        options: Option<&Value>,
    ) -> StoreResult<Vec<Value>> {
        if field.is_empty() || field.starts_with('$') {
            return Err(StoreError::InvalidFilter(format!(
                "invalid distinct key: '{}'",
                field
            )));
        }
        if let Some(options) = options {
            // Only collation is accepted, and comparison ignores it
            let valid = options
                .as_object()
                .is_some_and(|o| o.keys().all(|k| k == "collation"));
            if !valid && !options.is_null() {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported distinct options: {}",
                    options
                )));
            }
        }
        let filter = Filter::parse(filter.unwrap_or(&Value::Null))?;

        let store = self.read()?;
        let mut values: Vec<Value> = Vec::new();
        let mut push_unique = |v: &Value| {
            if !values.iter().any(|seen| values_equal(seen, v)) {
                values.push(v.clone());
            }
        };

        for doc in store.iter().filter(|d| filter.matches(d)) {
            match get_path(doc, field) {
                Some(Value::Array(items)) => items.iter().for_each(&mut push_unique),
                Some(v) => push_unique(v),
                None => {}
            }
        }

        Ok(values)
    }
}

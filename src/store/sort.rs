//! Result sorting
//!
//! Sorts documents by one or more fields, stable and deterministic: ties keep
//! insertion order.

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::value::{compare_values, get_path};
use super::Document;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse a sort specification.
    ///
    /// Accepts `{"field": 1, "other": -1}` or `[["field", 1], ["other", -1]]`.
    pub fn parse_list(value: &Value) -> StoreResult<Vec<SortSpec>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Object(obj) => obj
                .iter()
                .map(|(field, dir)| Self::from_parts(field, dir))
                .collect(),
            Value::Array(pairs) => pairs
                .iter()
                .map(|pair| match pair.as_array().map(Vec::as_slice) {
                    Some([Value::String(field), dir]) => Self::from_parts(field, dir),
                    _ => Err(StoreError::InvalidSort(format!(
                        "expected [field, direction], got {}",
                        pair
                    ))),
                })
                .collect(),
            other => Err(StoreError::InvalidSort(format!(
                "sort must be an object or a list of pairs, got {}",
                other
            ))),
        }
    }

    fn from_parts(field: &str, direction: &Value) -> StoreResult<Self> {
        match direction.as_i64() {
            Some(1) => Ok(Self::asc(field)),
            Some(-1) => Ok(Self::desc(field)),
            _ => Err(StoreError::InvalidSort(format!(
                "bad sort direction for {}: {}",
                field, direction
            ))),
        }
    }
}

/// Sorts documents in place according to the specifications, in order
pub fn sort_documents(documents: &mut [Document], specs: &[SortSpec]) {
    if specs.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for spec in specs {
            let ordering = compare_values(get_path(a, &spec.field), get_path(b, &spec.field));
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

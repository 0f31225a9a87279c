//! Field projection for find results and `$project` stages

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::Document;

const ID_FIELD: &str = "_id";

/// Which fields to keep in result documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Keep only the listed fields (plus `_id` unless excluded)
    Include { fields: Vec<String>, keep_id: bool },

    /// Drop the listed fields
    Exclude(Vec<String>),
}

impl Projection {
    /// Parse `{"field": 1, ...}` or `{"field": 0, ...}`.
    ///
    /// Returns `None` for a null or empty projection.
    pub fn parse(value: &Value) -> StoreResult<Option<Self>> {
        let obj = match value {
            Value::Null => return Ok(None),
            Value::Object(obj) if obj.is_empty() => return Ok(None),
            Value::Object(obj) => obj,
            other => {
                return Err(StoreError::InvalidProjection(format!(
                    "projection must be an object, got {}",
                    other
                )))
            }
        };

        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut keep_id = true;

        for (field, flag) in obj {
            let include = flag_value(field, flag)?;
            if field == ID_FIELD {
                keep_id = include;
                if include {
                    included.push(field.clone());
                }
            } else if include {
                included.push(field.clone());
            } else {
                excluded.push(field.clone());
            }
        }

        let non_id_included = included.iter().any(|f| f != ID_FIELD);
        let id_only = !non_id_included && excluded.is_empty() && keep_id;
        match (non_id_included || id_only, excluded.is_empty()) {
            (true, false) => Err(StoreError::InvalidProjection(
                "cannot mix inclusion and exclusion".to_string(),
            )),
            (true, true) => Ok(Some(Projection::Include {
                fields: included.into_iter().filter(|f| f != ID_FIELD).collect(),
                keep_id,
            })),
            (false, _) => {
                if !keep_id {
                    excluded.insert(0, ID_FIELD.to_string());
                }
                Ok(Some(Projection::Exclude(excluded)))
            }
        }
    }

    /// Apply to a document, preserving the document's field order
    pub fn apply(&self, doc: Document) -> Document {
        match self {
            Projection::Include { fields, keep_id } => doc
                .into_iter()
                .filter(|(k, _)| (k == ID_FIELD && *keep_id) || fields.contains(k))
                .collect(),
            Projection::Exclude(fields) => doc
                .into_iter()
                .filter(|(k, _)| !fields.contains(k))
                .collect::<Map<String, Value>>(),
        }
    }
}

fn flag_value(field: &str, flag: &Value) -> StoreResult<bool> {
    match flag {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        _ => Err(StoreError::InvalidProjection(format!(
            "unsupported projection value for {}: {}",
            field, flag
        ))),
    }
}

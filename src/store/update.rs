//! Update operators for `find_one_and_update`

use serde_json::{Number, Value};

use super::errors::{StoreError, StoreResult};
use super::Document;

/// A single field modification
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace or add the field
    Set(String, Value),

    /// Remove the field
    Unset(String),

    /// Add to a numeric field (missing field starts from the increment)
    Inc(String, Number),
}

/// A parsed update document
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    /// Parse `{"$set": {...}, "$unset": {...}, "$inc": {...}}`.
    ///
    /// Replacement documents (no operators) are rejected.
    pub fn parse(value: &Value) -> StoreResult<Self> {
        let obj = value.as_object().filter(|o| !o.is_empty()).ok_or_else(|| {
            StoreError::InvalidUpdate("update must be a nonempty object".to_string())
        })?;

        let mut ops = Vec::new();
        for (operator, fields) in obj {
            let fields = fields.as_object().ok_or_else(|| {
                StoreError::InvalidUpdate(format!("{} needs an object of fields", operator))
            })?;

            for (field, operand) in fields {
                if field == "_id" {
                    return Err(StoreError::InvalidUpdate(
                        "the _id field is immutable".to_string(),
                    ));
                }

                let op = match operator.as_str() {
                    "$set" => UpdateOp::Set(field.clone(), operand.clone()),
                    "$unset" => UpdateOp::Unset(field.clone()),
                    "$inc" => match operand {
                        Value::Number(n) => UpdateOp::Inc(field.clone(), n.clone()),
                        _ => {
                            return Err(StoreError::InvalidUpdate(format!(
                                "cannot increment with non-numeric argument: {}",
                                operand
                            )))
                        }
                    },
                    other if other.starts_with('$') => {
                        return Err(StoreError::InvalidUpdate(format!(
                            "unknown update operator: {}",
                            other
                        )))
                    }
                    _ => {
                        return Err(StoreError::InvalidUpdate(
                            "update only works with $ operators".to_string(),
                        ))
                    }
                };
                ops.push(op);
            }
        }

        Ok(Self { ops })
    }

    /// Apply every operator to the document.
    ///
    /// On error the document may be partially modified; callers apply to a
    /// copy.
    pub fn apply(&self, doc: &mut Document) -> StoreResult<()> {
        for op in &self.ops {
            match op {
                UpdateOp::Set(field, value) => {
                    doc.insert(field.clone(), value.clone());
                }
                UpdateOp::Unset(field) => {
                    doc.remove(field);
                }
                UpdateOp::Inc(field, by) => {
                    let next = match doc.get(field) {
                        None => Value::Number(by.clone()),
                        Some(Value::Number(current)) => add_numbers(current, by),
                        Some(other) => {
                            return Err(StoreError::InvalidUpdate(format!(
                                "cannot apply $inc to non-numeric field {} ({})",
                                field, other
                            )))
                        }
                    };
                    doc.insert(field.clone(), next);
                }
            }
        }
        Ok(())
    }
}

/// Integers stay integers unless either side is a float
fn add_numbers(a: &Number, b: &Number) -> Value {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Value::from(sum);
        }
    }
    let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
    Value::from(sum)
}

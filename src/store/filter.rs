//! # Filter Expressions
//!
//! Parses query filters written as JSON documents and evaluates them
//! against stored documents.
//!
//! ```text
//! {"Region": "Western Europe", "Happiness_Score": {"$gte": 7.0, "$lte": 8.0}}
//! {"$or": [{"country": {"$regex": "^Swi", "$options": "i"}}, {"Family": {"$gt": 1.3}}]}
//! ```
//!
//! Fields at the same level combine with AND semantics.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::object_id::OID_KEY;
use super::value::{compare_same_type, get_path, values_equal};
use super::Document;

/// Comparison applied to a single field
#[derive(Debug, Clone)]
pub enum FilterOp {
    /// Equals
    Eq(Value),

    /// Not equals (also matches a missing field)
    Ne(Value),

    /// Greater than
    Gt(Value),

    /// Greater than or equal
    Gte(Value),

    /// Less than
    Lt(Value),

    /// Less than or equal
    Lte(Value),

    /// Value in list
    In(Vec<Value>),

    /// Value not in list
    Nin(Vec<Value>),

    /// Field presence
    Exists(bool),

    /// Regular expression match on string fields
    Regex(Regex),
}

/// A parsed filter expression
#[derive(Debug, Clone)]
pub enum Filter {
    /// All sub-filters must match (an empty list matches everything)
    And(Vec<Filter>),

    /// At least one sub-filter must match
    Or(Vec<Filter>),

    /// No sub-filter may match
    Nor(Vec<Filter>),

    /// Single field predicate
    Field { field: String, op: FilterOp },
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    /// Parse a JSON filter document
    pub fn parse(value: &Value) -> StoreResult<Self> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::Object(obj) => Self::parse_object(obj),
            other => Err(StoreError::InvalidFilter(format!(
                "filter must be an object, got {}",
                other
            ))),
        }
    }

    fn parse_object(obj: &Map<String, Value>) -> StoreResult<Self> {
        let mut clauses = Vec::with_capacity(obj.len());

        for (key, value) in obj {
            match key.as_str() {
                "$and" => clauses.push(Filter::And(Self::parse_list(key, value)?)),
                "$or" => clauses.push(Filter::Or(Self::parse_list(key, value)?)),
                "$nor" => clauses.push(Filter::Nor(Self::parse_list(key, value)?)),
                op if op.starts_with('$') => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unknown top level operator: {}",
                        op
                    )))
                }
                field => clauses.extend(Self::parse_field(field, value)?),
            }
        }

        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(Filter::And(clauses))
        }
    }

    fn parse_list(op: &str, value: &Value) -> StoreResult<Vec<Filter>> {
        let items = value
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| StoreError::InvalidFilter(format!("{} must be a nonempty array", op)))?;
        items.iter().map(Self::parse).collect()
    }

    fn parse_field(field: &str, value: &Value) -> StoreResult<Vec<Filter>> {
        let operators = match value {
            Value::Object(obj) if is_operator_object(obj) => obj,
            literal => {
                return Ok(vec![Filter::Field {
                    field: field.to_string(),
                    op: FilterOp::Eq(literal.clone()),
                }])
            }
        };

        let options = operators.get("$options").and_then(Value::as_str).unwrap_or("");
        let mut predicates = Vec::with_capacity(operators.len());

        for (op, operand) in operators {
            let op = match op.as_str() {
                "$eq" => FilterOp::Eq(operand.clone()),
                "$ne" => FilterOp::Ne(operand.clone()),
                "$gt" => FilterOp::Gt(operand.clone()),
                "$gte" => FilterOp::Gte(operand.clone()),
                "$lt" => FilterOp::Lt(operand.clone()),
                "$lte" => FilterOp::Lte(operand.clone()),
                "$in" => FilterOp::In(expect_array(op, operand)?),
                "$nin" => FilterOp::Nin(expect_array(op, operand)?),
                "$exists" => FilterOp::Exists(is_truthy(operand)),
                "$regex" => FilterOp::Regex(build_regex(operand, options)?),
                "$options" => {
                    if !operators.contains_key("$regex") {
                        return Err(StoreError::InvalidFilter(
                            "$options needs a $regex".to_string(),
                        ));
                    }
                    continue;
                }
                unknown => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unknown operator: {}",
                        unknown
                    )))
                }
            };
            predicates.push(Filter::Field {
                field: field.to_string(),
                op,
            });
        }

        Ok(predicates)
    }

    /// Check if a document matches this filter
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Filter::Nor(filters) => !filters.iter().any(|f| f.matches(doc)),
            Filter::Field { field, op } => op.matches(get_path(doc, field)),
        }
    }
}

impl FilterOp {
    /// Evaluate against the field value (`None` when the field is absent)
    pub fn matches(&self, field_value: Option<&Value>) -> bool {
        match self {
            FilterOp::Exists(expected) => field_value.is_some() == *expected,
            FilterOp::Eq(expected) => eq_match(field_value, expected),
            FilterOp::Ne(expected) => !eq_match(field_value, expected),
            FilterOp::In(candidates) => candidates.iter().any(|c| eq_match(field_value, c)),
            FilterOp::Nin(candidates) => !candidates.iter().any(|c| eq_match(field_value, c)),
            FilterOp::Gt(bound) => range_match(field_value, bound, |o| o == Ordering::Greater),
            FilterOp::Gte(bound) => range_match(field_value, bound, |o| o != Ordering::Less),
            FilterOp::Lt(bound) => range_match(field_value, bound, |o| o == Ordering::Less),
            FilterOp::Lte(bound) => range_match(field_value, bound, |o| o != Ordering::Greater),
            FilterOp::Regex(re) => any_element(field_value, |v| {
                v.as_str().is_some_and(|s| re.is_match(s))
            }),
        }
    }
}

/// `{"$gte": 1}` is an operator object, `{"$oid": "..."}` is a literal id
fn is_operator_object(obj: &Map<String, Value>) -> bool {
    obj.keys()
        .next()
        .is_some_and(|k| k.starts_with('$') && k != OID_KEY)
}

/// Equality, where a missing field equals null and arrays match on any element
fn eq_match(field_value: Option<&Value>, expected: &Value) -> bool {
    match field_value {
        None => expected.is_null(),
        Some(actual) => {
            values_equal(actual, expected)
                || matches!(actual, Value::Array(items) if items.iter().any(|v| values_equal(v, expected)))
        }
    }
}

fn range_match(field_value: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    any_element(field_value, |v| compare_same_type(v, bound).is_some_and(&accept))
}

fn any_element(field_value: Option<&Value>, pred: impl Fn(&Value) -> bool) -> bool {
    match field_value {
        None => false,
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(v) => pred(v),
    }
}

fn expect_array(op: &str, operand: &Value) -> StoreResult<Vec<Value>> {
    operand
        .as_array()
        .cloned()
        .ok_or_else(|| StoreError::InvalidFilter(format!("{} needs an array", op)))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

fn build_regex(pattern: &Value, options: &str) -> StoreResult<Regex> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| StoreError::InvalidFilter("$regex has to be a string".to_string()))?;

    let mut builder = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "invalid flag in regex options: {}",
                    other
                )))
            }
        };
    }

    builder
        .build()
        .map_err(|e| StoreError::InvalidFilter(format!("bad $regex: {}", e)))
}

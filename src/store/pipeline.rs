//! # Aggregation Pipeline
//!
//! Ordered sequence of stages, each transforming the document stream
//! produced by the previous one.
//!
//! Supported stages: `$match`, `$group`, `$sort`, `$limit`, `$skip`,
//! `$project`, `$count`.

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::filter::Filter;
use super::projection::Projection;
use super::sort::{sort_documents, SortSpec};
use super::value::{compare_values, get_path, values_equal};
use super::Document;

/// Expression evaluated per document
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `"$field"` reference
    Field(String),

    /// Any other JSON value
    Literal(Value),
}

impl Expr {
    pub fn parse(value: &Value) -> Self {
        match value.as_str().and_then(|s| s.strip_prefix('$')) {
            Some(path) => Expr::Field(path.to_string()),
            None => Expr::Literal(value.clone()),
        }
    }

    /// Evaluate; `None` when a referenced field is missing
    pub fn eval<'a>(&'a self, doc: &'a Document) -> Option<&'a Value> {
        match self {
            Expr::Field(path) => get_path(doc, path),
            Expr::Literal(value) => Some(value),
        }
    }
}

/// `$group` accumulator operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Avg,
    Sum,
    Min,
    Max,
    StdDevPop,
    First,
    Last,
    Count,
}

impl Accumulator {
    fn parse(name: &str) -> StoreResult<Self> {
        Ok(match name {
            "$avg" => Accumulator::Avg,
            "$sum" => Accumulator::Sum,
            "$min" => Accumulator::Min,
            "$max" => Accumulator::Max,
            "$stdDevPop" => Accumulator::StdDevPop,
            "$first" => Accumulator::First,
            "$last" => Accumulator::Last,
            "$count" => Accumulator::Count,
            other => {
                return Err(StoreError::InvalidPipeline(format!(
                    "unknown group operator '{}'",
                    other
                )))
            }
        })
    }

    /// Reduce the values of one group.
    ///
    /// `values` holds the evaluated expression per document, `None` when the
    /// field was missing.
    fn reduce(&self, values: &[Option<&Value>]) -> Value {
        let numbers = || values.iter().flatten().filter_map(|v| v.as_f64());

        match self {
            Accumulator::Count => Value::from(values.len() as u64),
            Accumulator::Sum => {
                let present: Vec<&Value> = values.iter().flatten().copied().collect();
                let integer_sum = present.iter().try_fold(0i64, |total, v| {
                    v.as_i64().and_then(|x| total.checked_add(x))
                });
                match integer_sum {
                    Some(total) => Value::from(total),
                    None => Value::from(numbers().sum::<f64>()),
                }
            }
            Accumulator::Avg => {
                let (sum, count) = numbers().fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
                if count == 0 {
                    Value::Null
                } else {
                    Value::from(sum / count as f64)
                }
            }
            Accumulator::StdDevPop => {
                let xs: Vec<f64> = numbers().collect();
                if xs.is_empty() {
                    return Value::Null;
                }
                let n = xs.len() as f64;
                let mean = xs.iter().sum::<f64>() / n;
                let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
                Value::from(variance.sqrt())
            }
            Accumulator::Min | Accumulator::Max => {
                let present = values.iter().flatten().filter(|v| !v.is_null());
                let picked = if *self == Accumulator::Min {
                    present.min_by(|a, b| compare_values(Some(**a), Some(**b)))
                } else {
                    present.max_by(|a, b| compare_values(Some(**a), Some(**b)))
                };
                picked.map(|v| (*v).clone()).unwrap_or(Value::Null)
            }
            Accumulator::First => values
                .first()
                .copied()
                .flatten()
                .cloned()
                .unwrap_or(Value::Null),
            Accumulator::Last => values
                .last()
                .copied()
                .flatten()
                .cloned()
                .unwrap_or(Value::Null),
        }
    }
}

/// Output field of a `$group` stage
#[derive(Debug, Clone, PartialEq)]
pub struct GroupField {
    pub name: String,
    pub accumulator: Accumulator,
    pub expr: Expr,
}

/// `$group` stage specification
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub key: Expr,
    pub fields: Vec<GroupField>,
}

impl GroupSpec {
    fn parse(value: &Value) -> StoreResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            StoreError::InvalidPipeline("$group takes an object".to_string())
        })?;
        let key = obj.get("_id").map(Expr::parse).ok_or_else(|| {
            StoreError::InvalidPipeline("a group specification must include an _id".to_string())
        })?;

        let mut fields = Vec::new();
        for (name, spec) in obj.iter().filter(|(k, _)| *k != "_id") {
            let (op, arg) = spec
                .as_object()
                .filter(|o| o.len() == 1)
                .and_then(|o| o.iter().next())
                .ok_or_else(|| {
                    StoreError::InvalidPipeline(format!(
                        "the field '{}' must be an accumulator object",
                        name
                    ))
                })?;
            fields.push(GroupField {
                name: name.clone(),
                accumulator: Accumulator::parse(op)?,
                expr: Expr::parse(arg),
            });
        }

        Ok(Self { key, fields })
    }

    /// Groups appear in order of first appearance of their key
    fn run(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut groups: Vec<(Value, Vec<&Document>)> = Vec::new();
        for doc in &docs {
            let key = self.key.eval(doc).cloned().unwrap_or(Value::Null);
            match groups.iter_mut().find(|(k, _)| values_equal(k, &key)) {
                Some((_, members)) => members.push(doc),
                None => groups.push((key, vec![doc])),
            }
        }

        groups
            .into_iter()
            .map(|(key, members)| {
                let mut out = Map::new();
                out.insert("_id".to_string(), key);
                for field in &self.fields {
                    let values: Vec<Option<&Value>> =
                        members.iter().map(|doc| field.expr.eval(doc)).collect();
                    out.insert(field.name.clone(), field.accumulator.reduce(&values));
                }
                out
            })
            .collect()
    }
}

/// One pipeline stage
#[derive(Debug, Clone)]
pub enum Stage {
    Match(Filter),
    Group(GroupSpec),
    Sort(Vec<SortSpec>),
    Limit(usize),
    Skip(usize),
    Project(Option<Projection>),
    Count(String),
}

impl Stage {
    fn parse(value: &Value) -> StoreResult<Self> {
        let (name, arg) = value
            .as_object()
            .filter(|o| o.len() == 1)
            .and_then(|o| o.iter().next())
            .ok_or_else(|| {
                StoreError::InvalidPipeline(format!(
                    "a pipeline stage must be an object with exactly one field, got {}",
                    value
                ))
            })?;

        match name.as_str() {
            "$match" => Ok(Stage::Match(Filter::parse(arg)?)),
            "$group" => Ok(Stage::Group(GroupSpec::parse(arg)?)),
            "$sort" => {
                let specs = SortSpec::parse_list(arg)?;
                if specs.is_empty() {
                    return Err(StoreError::InvalidPipeline(
                        "$sort stage must have at least one sort key".to_string(),
                    ));
                }
                Ok(Stage::Sort(specs))
            }
            "$limit" => Ok(Stage::Limit(positive_count(name, arg)?)),
            "$skip" => Ok(Stage::Skip(positive_count(name, arg)?)),
            "$project" => Ok(Stage::Project(
                Projection::parse(arg).map_err(|e| StoreError::InvalidPipeline(e.to_string()))?,
            )),
            "$count" => match arg.as_str() {
                Some(field) if !field.is_empty() && !field.starts_with('$') => {
                    Ok(Stage::Count(field.to_string()))
                }
                _ => Err(StoreError::InvalidPipeline(
                    "$count takes a nonempty field name not starting with $".to_string(),
                )),
            },
            other => Err(StoreError::InvalidPipeline(format!(
                "unrecognized pipeline stage name: '{}'",
                other
            ))),
        }
    }

    fn run(&self, mut docs: Vec<Document>) -> Vec<Document> {
        match self {
            Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Group(spec) => spec.run(docs),
            Stage::Sort(specs) => {
                sort_documents(&mut docs, specs);
                docs
            }
            Stage::Limit(n) => docs.into_iter().take(*n).collect(),
            Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
            Stage::Project(None) => docs,
            Stage::Project(Some(projection)) => {
                docs.into_iter().map(|d| projection.apply(d)).collect()
            }
            Stage::Count(field) => {
                if docs.is_empty() {
                    return Vec::new();
                }
                let mut out = Map::new();
                out.insert(field.clone(), Value::from(docs.len() as u64));
                vec![out]
            }
        }
    }
}

/// A parsed aggregation pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Parse a JSON array of stages
    pub fn parse(value: &Value) -> StoreResult<Self> {
        let stages = value
            .as_array()
            .ok_or_else(|| StoreError::InvalidPipeline("pipeline must be a list".to_string()))?
            .iter()
            .map(Stage::parse)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self { stages })
    }

    /// Run every stage over the input documents
    pub fn run(&self, docs: Vec<Document>) -> Vec<Document> {
        self.stages.iter().fold(docs, |docs, stage| stage.run(docs))
    }
}

fn positive_count(stage: &str, arg: &Value) -> StoreResult<usize> {
    arg.as_u64()
        .filter(|n| *n > 0 || stage == "$skip")
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| StoreError::InvalidPipeline(format!("invalid argument to {}: {}", stage, arg)))
}

//! # Query/Aggregate Helpers
//!
//! Named single-purpose queries over the countries collection. Each helper
//! builds one filter or pipeline, submits it to the collection, and reduces
//! the result into a [`Table`] or shaped records.
//!
//! Zero matching documents is an empty result, never an error, unless a
//! helper says otherwise.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug_span;

use super::errors::{CountryError, CountryResult};
use super::model::{validate_patch, Country, COUNTRY_FIELDS, HAPPINESS_SCORE, NUMERIC_FIELDS};
use super::shaper::{countries_entity, country_entity, serialize_document, serialize_documents, stringify_id};
use super::table::Table;
use crate::observability::{log_event_with_fields, Event};
use crate::store::{Document, DocumentCollection, FindOptions, ObjectId};

/// Group key of the world average pipelines
const WORLD_AVERAGE_KEY: &str = "World_Average_Happiness";

/// Column name of a `distinct` result
const DISTINCT_COLUMN: &str = "0";

/// Query helpers bound to one collection
#[derive(Clone)]
pub struct CountryQueries {
    collection: Arc<dyn DocumentCollection>,
}

impl CountryQueries {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    // ==================
    // Writes
    // ==================

    /// Insert a new country, returning its identifier string
    pub fn insert_country(&self, country: &Country) -> CountryResult<String> {
        self.run("insert_country", || {
            let id = self.collection.insert_one(country.to_document())?;
            let created_at = ObjectId::from_json(&id)
                .map(|oid| oid.timestamp().to_rfc3339())
                .unwrap_or_default();
            let id = stringify_id(&id);
            log_event_with_fields(
                Event::CountryInserted,
                &[
                    ("id", &id),
                    ("country", &country.country),
                    ("created_at", &created_at),
                ],
            );
            Ok(id)
        })
    }

    /// Overwrite the supplied fields of one country, one field at a time.
    ///
    /// Keys outside the twelve domain fields and empty-string values are
    /// skipped. Returns the document as it was before the last applied
    /// update; `None` when nothing matched or no field applied.
    pub fn update_country(&self, id: &str, new_data: &Document) -> CountryResult<Option<Document>> {
        self.run("update_country", || {
            let filter = id_filter(id)?;
            validate_patch(new_data)?;

            let mut previous = None;
            let applicable = new_data
                .iter()
                .filter(|(k, v)| COUNTRY_FIELDS.contains(&k.as_str()) && v.as_str() != Some(""));
            for (key, value) in applicable {
                let update = json!({ "$set": { key.as_str(): value } });
                previous = self.collection.find_one_and_update(&filter, &update)?;
            }

            if previous.is_some() {
                log_event_with_fields(Event::CountryUpdated, &[("id", id)]);
            }
            Ok(previous)
        })
    }

    /// Delete one country by identifier; `NotFound` when absent
    pub fn delete_country(&self, id: &str) -> CountryResult<()> {
        self.run("delete_country", || {
            let deleted = self.collection.delete_one(&id_filter(id)?)?;
            if deleted == 0 {
                return Err(CountryError::NotFound);
            }
            log_event_with_fields(Event::CountryDeleted, &[("id", id)]);
            Ok(())
        })
    }

    // ==================
    // Lookups
    // ==================

    /// Shaped record of one country; `NotFound` when absent
    pub fn get_country_by_id(&self, id: &str) -> CountryResult<Document> {
        self.run("get_country_by_id", || {
            let doc = self
                .collection
                .find_one(&id_filter(id)?, &FindOptions::new())?
                .ok_or(CountryError::NotFound)?;
            country_entity(&doc)
        })
    }

    /// Exact name match without `_id`; `None` when not found
    pub fn country_by_name(&self, name: &str) -> CountryResult<Option<Table>> {
        self.run("country_by_name", || {
            let options = FindOptions::new().projection(json!({"_id": 0}));
            let found = self.collection.find_one(&json!({"country": name}), &options)?;
            Ok(found.map(|doc| Table::from_rows(vec![serialize_document(doc)])))
        })
    }

    /// Every document with `_id` stringified and the ten numeric fields
    /// rendered as strings
    pub fn all_countries(&self) -> CountryResult<Table> {
        self.run("all_countries", || {
            let docs = self.collection.find(&json!({}), &FindOptions::new())?;
            let mut rows = Table::from_rows(serialize_documents(docs)).into_rows();
            for row in &mut rows {
                for field in NUMERIC_FIELDS {
                    if let Some(value) = row.get_mut(field) {
                        *value = Value::String(display_string(value));
                    }
                }
            }
            Ok(Table::from_rows(rows))
        })
    }

    /// Case-insensitive partial match on the country name.
    ///
    /// The input is matched literally, not as a pattern.
    pub fn search_countries(&self, name: &str) -> CountryResult<Vec<Document>> {
        self.run("search_countries", || {
            let filter = json!({"country": {"$regex": regex::escape(name), "$options": "i"}});
            self.shaped(&filter, &FindOptions::new())
        })
    }

    pub fn countries_by_region(&self, region: &str) -> CountryResult<Vec<Document>> {
        self.run("countries_by_region", || {
            self.shaped(&json!({"Region": region}), &FindOptions::new())
        })
    }

    /// All countries, happiest first
    pub fn countries_ranked_by_happiness(&self) -> CountryResult<Vec<Document>> {
        self.run("countries_ranked_by_happiness", || {
            let options = FindOptions::new().sort(json!([[HAPPINESS_SCORE, -1]]));
            self.shaped(&json!({}), &options)
        })
    }

    /// Countries whose trust score is strictly above the threshold
    pub fn countries_by_trust(&self, threshold: f64) -> CountryResult<Vec<Document>> {
        self.run("countries_by_trust", || {
            let filter = json!({"Trust_Government_Corruption": {"$gt": threshold}});
            self.shaped(&filter, &FindOptions::new())
        })
    }

    // ==================
    // Happiness score
    // ==================

    /// Countries with a score in `[h1, h2]`, natural order.
    ///
    /// `h1 > h2` is an empty table.
    pub fn countries_happiness_between(&self, h1: f64, h2: f64) -> CountryResult<Table> {
        self.run("countries_happiness_between", || {
            let filter = json!({HAPPINESS_SCORE: {"$gte": h1, "$lte": h2}});
            let docs = self.collection.find(&filter, &FindOptions::new())?;
            let rows = docs.iter().map(country_score_row).collect::<CountryResult<Vec<_>>>()?;
            Ok(Table::from_rows(rows))
        })
    }

    /// Single row `{avgHappinessScore}`; empty on an empty collection
    pub fn world_average_happiness(&self) -> CountryResult<Table> {
        self.run("world_average_happiness", || {
            let pipeline = json!([{"$group": {
                "_id": WORLD_AVERAGE_KEY,
                "avgHappinessScore": {"$avg": "$Happiness_Score"}
            }}]);
            let rows = self
                .collection
                .aggregate(&pipeline)?
                .into_iter()
                .map(|group| {
                    let mut row = Document::new();
                    let avg = group.get("avgHappinessScore").cloned().unwrap_or(Value::Null);
                    row.insert("avgHappinessScore".to_string(), avg);
                    row
                })
                .collect();
            Ok(Table::from_rows(rows))
        })
    }

    /// Average, minimum, maximum and population standard deviation of the
    /// score; an empty mapping on an empty collection
    pub fn happiness_scores_stats(&self) -> CountryResult<Document> {
        self.run("happiness_scores_stats", || {
            let pipeline = json!([{"$group": {
                "_id": null,
                "avgHappinessScore": {"$avg": "$Happiness_Score"},
                "minHappinessScore": {"$min": "$Happiness_Score"},
                "maxHappinessScore": {"$max": "$Happiness_Score"},
                "stdDevHappinessScore": {"$stdDevPop": "$Happiness_Score"}
            }}]);
            let stats = self.collection.aggregate(&pipeline)?.into_iter().next();
            Ok(stats
                .map(|mut group| {
                    group.remove("_id");
                    group
                })
                .unwrap_or_default())
        })
    }

    /// Lowest score; ties go to the first document in natural order
    pub fn least_happy_country(&self) -> CountryResult<Table> {
        self.run("least_happy_country", || self.extreme_country(1))
    }

    /// Highest score; ties go to the first document in natural order
    pub fn most_happy_country(&self) -> CountryResult<Table> {
        self.run("most_happy_country", || self.extreme_country(-1))
    }

    /// Number of countries scoring at or above the average, and the average.
    ///
    /// `None` on an empty collection.
    pub fn nb_countries_happiness_sup_avg(&self) -> CountryResult<Option<(u64, f64)>> {
        self.run("nb_countries_happiness_sup_avg", || self.count_against_average("$gte"))
    }

    /// Number of countries scoring at or below the average, and the average.
    ///
    /// `None` on an empty collection.
    pub fn nb_countries_happiness_inf_avg(&self) -> CountryResult<Option<(u64, f64)>> {
        self.run("nb_countries_happiness_inf_avg", || self.count_against_average("$lte"))
    }

    // ==================
    // Pass-through (trusted callers only)
    // ==================

    /// Run any aggregation pipeline
    pub fn aggregation_request(&self, pipeline: &Value) -> CountryResult<Table> {
        self.run("aggregation_request", || {
            let docs = self.collection.aggregate(pipeline)?;
            Ok(Table::from_rows(serialize_documents(docs)))
        })
    }

    /// Run any find: `[filter]` or `[filter, projection]`
    pub fn find_request(&self, parts: &[Value]) -> CountryResult<Table> {
        self.run("find_request", || {
            let (filter, options) = match parts {
                [filter] => (filter, FindOptions::new()),
                [filter, projection] => (filter, FindOptions::new().projection(projection.clone())),
                _ => {
                    return Err(CountryError::invalid_request(format!(
                        "find takes 1 or 2 parts, got {}",
                        parts.len()
                    )))
                }
            };
            let docs = self.collection.find(filter, &options)?;
            Ok(Table::from_rows(serialize_documents(docs)))
        })
    }

    /// Run any distinct: `[field]`, `[field, filter]` or
    /// `[field, filter, options]`
    pub fn distinct_request(&self, parts: &[Value]) -> CountryResult<Table> {
        self.run("distinct_request", || {
            if parts.is_empty() || parts.len() > 3 {
                return Err(CountryError::invalid_request(format!(
                    "distinct takes 1 to 3 parts, got {}",
                    parts.len()
                )));
            }
            let field = parts[0].as_str().ok_or_else(|| {
                CountryError::invalid_request(format!("distinct key must be a string: {}", parts[0]))
            })?;

            let values = self
                .collection
                .distinct(field, parts.get(1), parts.get(2))?;
            let rows = values
                .into_iter()
                .map(|v| {
                    let mut row = Document::new();
                    row.insert(DISTINCT_COLUMN.to_string(), v);
                    row
                })
                .collect();
            Ok(Table::from_rows(rows))
        })
    }

    // ==================
    // Internals
    // ==================

    fn run<T>(&self, helper: &'static str, f: impl FnOnce() -> CountryResult<T>) -> CountryResult<T> {
        let _span = debug_span!("query", helper, collection = self.collection.name()).entered();
        let result = f();
        match &result {
            Ok(_) => log_event_with_fields(Event::QueryExecuted, &[("helper", helper)]),
            Err(CountryError::NotFound) => {}
            Err(e) => log_event_with_fields(
                Event::QueryRejected,
                &[("helper", helper), ("error", &e.to_string())],
            ),
        }
        result
    }

    fn shaped(&self, filter: &Value, options: &FindOptions) -> CountryResult<Vec<Document>> {
        let docs = self.collection.find(filter, options)?;
        countries_entity(&docs)
    }

    fn extreme_country(&self, direction: i32) -> CountryResult<Table> {
        let options = FindOptions::new().sort(json!([[HAPPINESS_SCORE, direction]]));
        let rows = match self.collection.find_one(&json!({}), &options)? {
            Some(doc) => vec![country_score_row(&doc)?],
            None => Vec::new(),
        };
        Ok(Table::from_rows(rows))
    }

    fn average_happiness(&self) -> CountryResult<Option<f64>> {
        let pipeline = json!([{"$group": {
            "_id": WORLD_AVERAGE_KEY,
            "avg": {"$avg": "$Happiness_Score"}
        }}]);
        let avg = self
            .collection
            .aggregate(&pipeline)?
            .into_iter()
            .next()
            .and_then(|group| group.get("avg").and_then(Value::as_f64));
        Ok(avg)
    }

    fn count_against_average(&self, operator: &str) -> CountryResult<Option<(u64, f64)>> {
        let Some(avg) = self.average_happiness()? else {
            return Ok(None);
        };
        let count = self
            .collection
            .count_documents(&json!({HAPPINESS_SCORE: {operator: avg}}))?;
        Ok(Some((count, avg)))
    }
}

/// `_id` equality filter for an identifier string
fn id_filter(id: &str) -> CountryResult<Value> {
    let oid = ObjectId::parse_str(id)?;
    Ok(json!({"_id": oid.to_json()}))
}

/// `{Country, Happiness_Score}` row; the name is required, the score is not
fn country_score_row(doc: &Document) -> CountryResult<Document> {
    let name = doc
        .get("country")
        .ok_or_else(|| CountryError::MissingField("country".to_string()))?;

    let mut row = Document::new();
    row.insert("Country".to_string(), name.clone());
    row.insert(
        HAPPINESS_SCORE.to_string(),
        doc.get(HAPPINESS_SCORE).cloned().unwrap_or(Value::Null),
    );
    Ok(row)
}

/// Display form used by the full listing: strings verbatim, null as `nan`.
///
/// Numbers use serde_json formatting, so exponents print as `1e-7` rather
/// than `1e-07`.
fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "nan".to_string(),
        other => other.to_string(),
    }
}

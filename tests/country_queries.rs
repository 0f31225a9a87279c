//! Query helper behavior over the in-memory collection
//!
//! Test Categories:
//! 1. Insert, lookup and round-trip
//! 2. Partial updates
//! 3. Score range and extremes
//! 4. Averages
//! 5. Listings and pass-through requests

use std::sync::Arc;

use serde_json::{json, Value};

use happiness_api::countries::{country_entity, Country, CountryError, CountryQueries, COUNTRY_FIELDS};
use happiness_api::store::{Document, DocumentCollection, FindOptions, InMemoryCollection, ObjectId};

fn country(name: &str, region: &str, score: f64) -> Country {
    Country {
        country: name.to_string(),
        region: region.to_string(),
        happiness_rank: 1,
        happiness_score: score,
        standard_error: 0.03411,
        economy_gdp_per_capita: 1.39651,
        family: 1.34951,
        health_life_expectancy: 0.94143,
        freedom: 0.66557,
        trust_government_corruption: 0.41978,
        generosity: 0.29678,
        dystopia_residual: 2.51738,
    }
}

fn empty() -> (Arc<InMemoryCollection>, CountryQueries) {
    let collection = Arc::new(InMemoryCollection::new("countries"));
    let queries = CountryQueries::new(collection.clone());
    (collection, queries)
}

/// Scenario collection {A: 3.0, B: 5.0, C: 7.0}
fn scenario() -> (Arc<InMemoryCollection>, CountryQueries) {
    let (collection, queries) = empty();
    for (name, score) in [("A", 3.0), ("B", 5.0), ("C", 7.0)] {
        queries.insert_country(&country(name, "Test", score)).unwrap();
    }
    (collection, queries)
}

fn patch(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

// =============================================================================
// INSERT, LOOKUP, ROUND-TRIP
// =============================================================================

#[test]
fn test_insert_then_lookup_by_id() {
    let (_, queries) = empty();
    let payload = country("Switzerland", "Western Europe", 7.587);

    let id = queries.insert_country(&payload).unwrap();
    assert!(ObjectId::parse_str(&id).is_ok());

    let record = queries.get_country_by_id(&id).unwrap();
    assert_eq!(record["id"], json!(id));

    let mut expected = Document::new();
    expected.insert("id".to_string(), json!(id));
    expected.extend(payload.to_document());
    assert_eq!(record, expected);
}

#[test]
fn test_lookup_missing_id_is_not_found() {
    let (_, queries) = scenario();
    let absent = ObjectId::new().to_hex();
    assert_eq!(queries.get_country_by_id(&absent), Err(CountryError::NotFound));
}

#[test]
fn test_shaped_record_reinserts_to_equivalent_document() {
    let (collection, queries) = empty();
    let id = queries
        .insert_country(&country("Iceland", "Western Europe", 7.561))
        .unwrap();

    let stored = collection
        .find_one(&json!({}), &FindOptions::new())
        .unwrap()
        .unwrap();
    let shaped = country_entity(&stored).unwrap();

    let reparsed = Country::from_document(&shaped).unwrap();
    let second_id = queries.insert_country(&reparsed).unwrap();
    assert_ne!(second_id, id);

    let reinserted = collection
        .find_one(&json!({"_id": {"$oid": second_id}}), &FindOptions::new())
        .unwrap()
        .unwrap();

    for field in COUNTRY_FIELDS {
        assert_eq!(reinserted[field], stored[field], "field {}", field);
    }
    assert_eq!(reinserted.len(), stored.len());
}

#[test]
fn test_delete_country() {
    let (collection, queries) = scenario();
    let id = queries.insert_country(&country("D", "Test", 1.0)).unwrap();

    queries.delete_country(&id).unwrap();
    assert_eq!(collection.len().unwrap(), 3);
    assert_eq!(queries.delete_country(&id), Err(CountryError::NotFound));
}

// =============================================================================
// PARTIAL UPDATES
// =============================================================================

#[test]
fn test_update_skips_empty_strings() {
    let (_, queries) = empty();
    let id = queries.insert_country(&country("Norway", "Western Europe", 7.522)).unwrap();

    let before = queries
        .update_country(&id, &patch(json!({"Region": "", "Freedom": 0.7})))
        .unwrap();
    assert!(before.is_some());

    let record = queries.get_country_by_id(&id).unwrap();
    assert_eq!(record["Region"], json!("Western Europe"));
    assert_eq!(record["Freedom"], json!(0.7));
}

#[test]
fn test_update_returns_pre_update_snapshot() {
    let (_, queries) = empty();
    let id = queries.insert_country(&country("Canada", "North America", 7.427)).unwrap();

    let before = queries
        .update_country(&id, &patch(json!({"Happiness_Score": 7.5})))
        .unwrap()
        .unwrap();
    assert_eq!(before["Happiness_Score"], json!(7.427));
    assert_eq!(queries.get_country_by_id(&id).unwrap()["Happiness_Score"], json!(7.5));
}

#[test]
fn test_update_two_fields_returns_snapshot_before_last_write() {
    let (_, queries) = empty();
    let id = queries.insert_country(&country("Denmark", "Western Europe", 7.527)).unwrap();

    let before = queries
        .update_country(&id, &patch(json!({"Happiness_Score": 7.6, "Freedom": 0.7})))
        .unwrap()
        .unwrap();
    assert_eq!(before["Happiness_Score"], json!(7.6));
    assert_eq!(before["Freedom"], json!(0.66557));

    let record = queries.get_country_by_id(&id).unwrap();
    assert_eq!(record["Happiness_Score"], json!(7.6));
    assert_eq!(record["Freedom"], json!(0.7));
}

#[test]
fn test_update_only_empty_strings_leaves_document_unchanged() {
    let (_, queries) = empty();
    let id = queries.insert_country(&country("Finland", "Western Europe", 7.406)).unwrap();
    let original = queries.get_country_by_id(&id).unwrap();

    let result = queries
        .update_country(&id, &patch(json!({"country": "", "Region": ""})))
        .unwrap();
    assert!(result.is_none());
    assert_eq!(queries.get_country_by_id(&id).unwrap(), original);
}

#[test]
fn test_update_unknown_id_returns_none() {
    let (_, queries) = scenario();
    let absent = ObjectId::new().to_hex();
    let result = queries
        .update_country(&absent, &patch(json!({"Freedom": 0.1})))
        .unwrap();
    assert!(result.is_none());
}

// =============================================================================
// SCORE RANGE AND EXTREMES
// =============================================================================

#[test]
fn test_happiness_between_inclusive_bounds() {
    let (_, queries) = scenario();
    let table = queries.countries_happiness_between(3.0, 5.0).unwrap();
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        json!([
            {"Country": "A", "Happiness_Score": 3.0},
            {"Country": "B", "Happiness_Score": 5.0}
        ])
    );
}

#[test]
fn test_happiness_between_reversed_bounds_is_empty() {
    let (_, queries) = scenario();
    assert!(queries.countries_happiness_between(7.0, 3.0).unwrap().is_empty());
}

#[test]
fn test_least_and_most_happy() {
    let (_, queries) = scenario();

    let least = queries.least_happy_country().unwrap();
    assert_eq!(least.len(), 1);
    assert_eq!(least.rows()[0]["Country"], json!("A"));

    let most = queries.most_happy_country().unwrap();
    assert_eq!(most.rows()[0]["Country"], json!("C"));
    assert_eq!(most.rows()[0]["Happiness_Score"], json!(7.0));
}

#[test]
fn test_extremes_tie_goes_to_first_inserted() {
    let (_, queries) = empty();
    for name in ["First", "Second"] {
        queries.insert_country(&country(name, "Test", 4.0)).unwrap();
    }
    assert_eq!(queries.least_happy_country().unwrap().rows()[0]["Country"], json!("First"));
    assert_eq!(queries.most_happy_country().unwrap().rows()[0]["Country"], json!("First"));
}

#[test]
fn test_extremes_on_empty_collection() {
    let (_, queries) = empty();
    assert!(queries.least_happy_country().unwrap().is_empty());
    assert!(queries.most_happy_country().unwrap().is_empty());
}

// =============================================================================
// AVERAGES
// =============================================================================

#[test]
fn test_world_average() {
    let (_, queries) = scenario();
    let table = queries.world_average_happiness().unwrap();
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        json!([{"avgHappinessScore": 5.0}])
    );
}

#[test]
fn test_world_average_empty_collection() {
    let (_, queries) = empty();
    assert!(queries.world_average_happiness().unwrap().is_empty());
}

#[test]
fn test_counts_around_average() {
    let (_, queries) = scenario();
    assert_eq!(queries.nb_countries_happiness_sup_avg().unwrap(), Some((2, 5.0)));
    assert_eq!(queries.nb_countries_happiness_inf_avg().unwrap(), Some((2, 5.0)));
}

#[test]
fn test_counts_around_average_cover_collection() {
    let (collection, queries) = empty();
    for (i, score) in [2.5, 4.1, 4.9, 6.3, 7.2, 7.2].iter().enumerate() {
        queries
            .insert_country(&country(&format!("C{}", i), "Test", *score))
            .unwrap();
    }

    let (above, _) = queries.nb_countries_happiness_sup_avg().unwrap().unwrap();
    let (below, _) = queries.nb_countries_happiness_inf_avg().unwrap().unwrap();
    assert!(above + below >= collection.len().unwrap() as u64);
}

#[test]
fn test_counts_around_average_empty_collection() {
    let (_, queries) = empty();
    assert_eq!(queries.nb_countries_happiness_sup_avg().unwrap(), None);
    assert_eq!(queries.nb_countries_happiness_inf_avg().unwrap(), None);
}

// =============================================================================
// LISTINGS AND PASS-THROUGH REQUESTS
// =============================================================================

#[test]
fn test_all_countries_stringifies_numeric_fields() {
    let (_, queries) = scenario();
    let table = queries.all_countries().unwrap();
    assert_eq!(table.len(), 3);

    let first = &table.rows()[0];
    assert_eq!(first.keys().next().map(String::as_str), Some("_id"));
    assert!(ObjectId::parse_str(first["_id"].as_str().unwrap()).is_ok());
    assert_eq!(first["country"], json!("A"));
    assert_eq!(first["Happiness_Score"], json!("3.0"));
    assert_eq!(first["Happiness_Rank"], json!("1"));
    assert_eq!(first["Dystopia_Residual"], json!("2.51738"));
}

#[test]
fn test_country_by_name() {
    let (_, queries) = scenario();
    let table = queries.country_by_name("B").unwrap().unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.rows()[0].get("_id").is_none());
    assert_eq!(table.rows()[0]["Happiness_Score"], json!(5.0));

    assert!(queries.country_by_name("b").unwrap().is_none());
}

#[test]
fn test_ranked_and_filtered_listings() {
    let (_, queries) = empty();
    queries.insert_country(&country("Denmark", "Western Europe", 7.527)).unwrap();
    queries.insert_country(&country("Togo", "Sub-Saharan Africa", 2.839)).unwrap();
    let mut trusted = country("New Zealand", "Australia and New Zealand", 7.286);
    trusted.trust_government_corruption = 0.42922;
    queries.insert_country(&trusted).unwrap();

    let ranked: Vec<Value> = queries
        .countries_ranked_by_happiness()
        .unwrap()
        .into_iter()
        .map(|r| r["country"].clone())
        .collect();
    assert_eq!(ranked, vec![json!("Denmark"), json!("New Zealand"), json!("Togo")]);

    let by_trust = queries.countries_by_trust(0.42).unwrap();
    assert_eq!(by_trust.len(), 1);
    assert_eq!(by_trust[0]["country"], json!("New Zealand"));

    let by_region = queries.countries_by_region("Western Europe").unwrap();
    assert_eq!(by_region.len(), 1);

    let search = queries.search_countries("zeal").unwrap();
    assert_eq!(search.len(), 1);
    assert!(search[0].contains_key("id"));
}

#[test]
fn test_pass_through_requests() {
    let (_, queries) = scenario();

    let table = queries
        .aggregation_request(&json!([
            {"$match": {"Happiness_Score": {"$gte": 5.0}}},
            {"$sort": {"Happiness_Score": -1}},
            {"$project": {"_id": 0, "country": 1}}
        ]))
        .unwrap();
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        json!([{"country": "C"}, {"country": "B"}])
    );

    let table = queries.find_request(&[json!({"country": "A"})]).unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.rows()[0]["_id"].is_string());

    let table = queries
        .distinct_request(&[json!("country"), json!({"Happiness_Score": {"$lt": 6}})])
        .unwrap();
    assert_eq!(serde_json::to_value(&table).unwrap(), json!([{"0": "A"}, {"0": "B"}]));
}

#[test]
fn test_pass_through_malformed_expression_propagates() {
    let (_, queries) = scenario();
    let err = queries
        .aggregation_request(&json!([{"$explode": {}}]))
        .unwrap_err();
    assert!(matches!(err, CountryError::Storage(_)));
    assert!(err.is_client_error());
}

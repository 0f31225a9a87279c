//! Record shaping
//!
//! Converts stored documents into API-facing records. Stored documents carry
//! their identifier under `_id` in extended form; API records carry it as a
//! plain string.

use serde_json::Value;

use super::errors::{CountryError, CountryResult};
use super::model::{API_ID_FIELD, COUNTRY_FIELDS, ID_FIELD};
use crate::store::{Document, ObjectId};

/// String form of an identifier value.
///
/// `{"$oid": hex}` becomes `hex`, strings stay as they are, anything else
/// uses its JSON text.
pub fn stringify_id(id: &Value) -> String {
    if let Some(oid) = ObjectId::from_json(id) {
        return oid.to_hex();
    }
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Shape one stored document into `{id, <twelve domain fields>}`
pub fn country_entity(doc: &Document) -> CountryResult<Document> {
    let id = doc
        .get(ID_FIELD)
        .ok_or_else(|| CountryError::MissingField(ID_FIELD.to_string()))?;

    let mut record = Document::new();
    record.insert(API_ID_FIELD.to_string(), Value::String(stringify_id(id)));
    for field in COUNTRY_FIELDS {
        let value = doc
            .get(field)
            .ok_or_else(|| CountryError::MissingField(field.to_string()))?;
        record.insert(field.to_string(), value.clone());
    }

    Ok(record)
}

/// Shape every document, preserving order; the first malformed one fails
/// the whole call
pub fn countries_entity(docs: &[Document]) -> CountryResult<Vec<Document>> {
    docs.iter().map(country_entity).collect()
}

/// Stringify `_id` when present and leave every other field untouched.
///
/// `_id` is moved to the front of the result.
pub fn serialize_document(doc: Document) -> Document {
    let mut out = Document::new();
    if let Some(id) = doc.get(ID_FIELD) {
        out.insert(ID_FIELD.to_string(), Value::String(stringify_id(id)));
    }
    out.extend(doc.into_iter().filter(|(k, _)| k != ID_FIELD));
    out
}

pub fn serialize_documents(docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter().map(serialize_document).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::model::fixtures;
    use serde_json::json;

    const HEX: &str = "507f1f77bcf86cd799439011";

    fn stored() -> Document {
        let mut doc = Document::new();
        doc.insert("_id".to_string(), json!({"$oid": HEX}));
        doc.extend(fixtures::country("Finland", "Western Europe", 7.406).to_document());
        doc
    }

    #[test]
    fn test_stringify_id() {
        assert_eq!(stringify_id(&json!({"$oid": HEX})), HEX);
        assert_eq!(stringify_id(&json!("custom")), "custom");
        assert_eq!(stringify_id(&json!(42)), "42");
        assert_eq!(stringify_id(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_country_entity_has_id_and_domain_fields() {
        let record = country_entity(&stored()).unwrap();
        assert_eq!(record.len(), 13);
        assert_eq!(record["id"], json!(HEX));
        assert_eq!(record["country"], json!("Finland"));
        assert_eq!(record["Happiness_Score"], json!(7.406));
        assert!(record.get("_id").is_none());
    }

    #[test]
    fn test_country_entity_drops_unknown_fields() {
        let mut doc = stored();
        doc.insert("note".to_string(), json!("x"));
        assert!(country_entity(&doc).unwrap().get("note").is_none());
    }

    #[test]
    fn test_country_entity_missing_field() {
        let mut doc = stored();
        doc.remove("Generosity");
        assert_eq!(
            country_entity(&doc),
            Err(CountryError::MissingField("Generosity".to_string()))
        );

        let mut doc = stored();
        doc.remove("_id");
        assert_eq!(
            country_entity(&doc),
            Err(CountryError::MissingField("_id".to_string()))
        );
    }

    #[test]
    fn test_countries_entity_preserves_order() {
        let mut second = stored();
        second.insert("country".to_string(), json!("Sweden"));

        let records = countries_entity(&[stored(), second]).unwrap();
        assert_eq!(records[0]["country"], "Finland");
        assert_eq!(records[1]["country"], "Sweden");
        assert!(countries_entity(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_serialize_document_only_touches_id() {
        let mut doc = Document::new();
        doc.insert("score".to_string(), json!(5.0));
        doc.insert("_id".to_string(), json!({"$oid": HEX}));

        let out = serialize_document(doc);
        assert_eq!(out.keys().next().map(String::as_str), Some("_id"));
        assert_eq!(out["_id"], json!(HEX));
        assert_eq!(out["score"], json!(5.0));

        let no_id = serialize_document(json!({"a": 1}).as_object().cloned().unwrap());
        assert_eq!(Value::Object(no_id), json!({"a": 1}));
    }
}

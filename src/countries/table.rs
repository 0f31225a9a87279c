//! Tabular query results

use serde::Serialize;
use serde_json::Value;

use crate::store::Document;

/// Ordered sequence of rows sharing one set of columns.
///
/// Serializes as a JSON array of objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Document>,
}

impl Table {
    /// Build a table from heterogeneous rows.
    ///
    /// Columns are the union of all row keys in first-seen order; a row
    /// lacking a column gets `null` there.
    pub fn from_rows(rows: Vec<Document>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.remove(c).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[Document] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Document> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first row
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_rows_fills_missing_columns() {
        let table = Table::from_rows(vec![
            doc(json!({"a": 1, "b": 2})),
            doc(json!({"c": 3, "a": 4})),
        ]);
        assert_eq!(table.columns(), vec!["a", "b", "c"]);
        assert_eq!(table.rows()[0]["c"], Value::Null);
        assert_eq!(table.rows()[1], doc(json!({"a": 4, "b": null, "c": 3})));
    }

    #[test]
    fn test_serializes_as_array() {
        assert_eq!(serde_json::to_value(Table::default()).unwrap(), json!([]));
        let table = Table::from_rows(vec![doc(json!({"Country": "A"}))]);
        assert_eq!(serde_json::to_value(&table).unwrap(), json!([{"Country": "A"}]));
        assert_eq!(table.len(), 1);
    }
}

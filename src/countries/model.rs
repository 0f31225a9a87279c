//! Country record model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{CountryError, CountryResult};
use crate::store::Document;

/// Storage field holding the identifier
pub const ID_FIELD: &str = "_id";

/// API field holding the stringified identifier
pub const API_ID_FIELD: &str = "id";

/// The twelve domain fields, in record order
pub const COUNTRY_FIELDS: [&str; 12] = [
    "country",
    "Region",
    "Happiness_Rank",
    "Happiness_Score",
    "Standard_Error",
    "Economy_GDP_per_Capita",
    "Family",
    "Health_Life_Expectancy",
    "Freedom",
    "Trust_Government_Corruption",
    "Generosity",
    "Dystopia_Residual",
];

/// Domain fields rendered as strings by the full listing
pub const NUMERIC_FIELDS: [&str; 10] = [
    "Happiness_Rank",
    "Happiness_Score",
    "Standard_Error",
    "Economy_GDP_per_Capita",
    "Family",
    "Health_Life_Expectancy",
    "Freedom",
    "Trust_Government_Corruption",
    "Generosity",
    "Dystopia_Residual",
];

pub const HAPPINESS_SCORE: &str = "Happiness_Score";

/// A country of the happiness index, as supplied by callers on insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub country: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Happiness_Rank")]
    pub happiness_rank: i64,
    #[serde(rename = "Happiness_Score")]
    pub happiness_score: f64,
    #[serde(rename = "Standard_Error")]
    pub standard_error: f64,
    #[serde(rename = "Economy_GDP_per_Capita")]
    pub economy_gdp_per_capita: f64,
    #[serde(rename = "Family")]
    pub family: f64,
    #[serde(rename = "Health_Life_Expectancy")]
    pub health_life_expectancy: f64,
    #[serde(rename = "Freedom")]
    pub freedom: f64,
    #[serde(rename = "Trust_Government_Corruption")]
    pub trust_government_corruption: f64,
    #[serde(rename = "Generosity")]
    pub generosity: f64,
    #[serde(rename = "Dystopia_Residual")]
    pub dystopia_residual: f64,
}

impl Country {
    /// Storage form, fields in record order, without `_id`
    pub fn to_document(&self) -> Document {
        let values: [Value; 12] = [
            self.country.clone().into(),
            self.region.clone().into(),
            self.happiness_rank.into(),
            self.happiness_score.into(),
            self.standard_error.into(),
            self.economy_gdp_per_capita.into(),
            self.family.into(),
            self.health_life_expectancy.into(),
            self.freedom.into(),
            self.trust_government_corruption.into(),
            self.generosity.into(),
            self.dystopia_residual.into(),
        ];

        COUNTRY_FIELDS
            .iter()
            .map(|f| f.to_string())
            .zip(values)
            .collect()
    }

    /// Read the domain fields back out of a stored or shaped document
    pub fn from_document(doc: &Document) -> CountryResult<Self> {
        if let Some(missing) = COUNTRY_FIELDS.iter().find(|f| !doc.contains_key(**f)) {
            return Err(CountryError::MissingField(missing.to_string()));
        }
        let domain: Document = doc
            .iter()
            .filter(|(k, _)| COUNTRY_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(domain))
            .map_err(|e| CountryError::invalid_request(e.to_string()))
    }
}

/// Check the type of every known field of a partial update.
///
/// Empty strings are accepted for every field (they are skipped when the
/// update is applied); unknown keys are ignored.
pub fn validate_patch(patch: &Document) -> CountryResult<()> {
    for (key, value) in patch {
        if !COUNTRY_FIELDS.contains(&key.as_str()) || value.as_str() == Some("") {
            continue;
        }

        let ok = match key.as_str() {
            "country" | "Region" => value.is_string(),
            "Happiness_Rank" => value.is_i64() || value.is_u64(),
            _ => value.is_number(),
        };
        if !ok {
            return Err(CountryError::invalid_request(format!(
                "field '{}' has the wrong type: {}",
                key, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Country;

    /// A country with the given name, region and score
    pub fn country(name: &str, region: &str, score: f64) -> Country {
        Country {
            country: name.to_string(),
            region: region.to_string(),
            happiness_rank: 1,
            happiness_score: score,
            standard_error: 0.034,
            economy_gdp_per_capita: 1.39,
            family: 1.34,
            health_life_expectancy: 0.94,
            freedom: 0.66,
            trust_government_corruption: 0.41,
            generosity: 0.29,
            dystopia_residual: 2.51,
        }
    }
}

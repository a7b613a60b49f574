//! Currency metadata as fetched from the rate service.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A single currency, keyed by its code.
///
/// Created from a network fetch or loaded from the local store; immutable
/// after creation. The `details` map carries the remainder of the remote
/// record (symbol, country id, ...) without interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub display_name: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Currency {
    /// Display label, e.g. "USD - United States Dollar".
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.display_name)
    }
}

/// Wire format of `GET /api/v5/countries`.
///
/// The service keys results by country, so several records can share one
/// currency code.
#[derive(Debug, Deserialize)]
pub struct CountriesResponse {
    pub results: HashMap<String, CountryRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    #[serde(rename = "currencyId")]
    pub currency_id: String,
    #[serde(rename = "currencyName")]
    pub currency_name: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl CountriesResponse {
    /// Collapse country records into a deduplicated, code-ordered currency
    /// list. The first record seen for a code wins.
    pub fn into_currencies(self) -> Vec<Currency> {
        let mut by_code: BTreeMap<String, Currency> = BTreeMap::new();
        for record in self.results.into_values() {
            by_code.entry(record.currency_id.clone()).or_insert_with(|| Currency {
                code: record.currency_id,
                display_name: record.currency_name,
                details: record.details,
            });
        }
        by_code.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(currency_id: &str, currency_name: &str) -> CountryRecord {
        CountryRecord {
            currency_id: currency_id.to_string(),
            currency_name: currency_name.to_string(),
            details: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_into_currencies_dedups_shared_codes() {
        let mut results = HashMap::new();
        results.insert("US".to_string(), record("USD", "United States Dollar"));
        results.insert("EC".to_string(), record("USD", "United States Dollar"));
        results.insert("DE".to_string(), record("EUR", "Euro"));

        let currencies = CountriesResponse { results }.into_currencies();
        let codes: Vec<&str> = currencies.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["EUR", "USD"]);
    }

    #[test]
    fn test_country_record_keeps_extra_fields() {
        let json = r#"{
            "currencyId": "USD",
            "currencyName": "United States Dollar",
            "currencySymbol": "$",
            "id": "US"
        }"#;
        let record: CountryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.currency_id, "USD");
        assert_eq!(record.details.get("currencySymbol").unwrap(), "$");
    }

    #[test]
    fn test_label() {
        let currency = Currency {
            code: "EUR".to_string(),
            display_name: "Euro".to_string(),
            details: serde_json::Map::new(),
        };
        assert_eq!(currency.label(), "EUR - Euro");
    }
}

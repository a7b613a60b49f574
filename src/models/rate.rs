//! Conversion rates and the arithmetic that applies them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A directional conversion rate.
///
/// Pair identifiers are one-way: "USD_EUR" and "EUR_USD" are distinct
/// entries, and neither is ever derived from the other by inversion.
/// The serde names match the wire records of `GET /api/v5/convert`, which
/// are stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRate {
    #[serde(rename = "id")]
    pub pair_id: String,
    #[serde(rename = "val")]
    pub value: f64,
}

/// Wire format of `GET /api/v5/convert?q=FROM_TO`.
#[derive(Debug, Deserialize)]
pub struct ConvertResponse {
    pub results: HashMap<String, ConversionRate>,
}

/// Build the directional pair identifier for two currency codes.
/// Codes are not validated; an unknown code simply misses downstream.
pub fn pair_id(from: &str, to: &str) -> String {
    format!("{}_{}", from.to_uppercase(), to.to_uppercase())
}

/// Which amount field the user edited last. Directs the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditedField {
    From,
    To,
}

/// Apply `rate` to the edited amount, producing the opposite field's value.
///
/// Editing the "from" field multiplies, editing the "to" field divides.
/// Returns `None` when inverting a zero rate, which would divide by zero.
pub fn convert(rate: f64, amount: f64, edited: EditedField) -> Option<f64> {
    match edited {
        EditedField::From => Some(amount * rate),
        EditedField::To => {
            if rate == 0.0 {
                None
            } else {
                Some(amount / rate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pair_id_uppercases_codes() {
        assert_eq!(pair_id("usd", "eur"), "USD_EUR");
        assert_eq!(pair_id("EUR", "usd"), "EUR_USD");
    }

    #[test]
    fn test_convert_forward() {
        let result = convert(0.85, 100.0, EditedField::From).unwrap();
        assert_relative_eq!(result, 85.0, max_relative = 1e-12);
    }

    #[test]
    fn test_convert_inverse() {
        let result = convert(0.85, 85.0, EditedField::To).unwrap();
        assert_relative_eq!(result, 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_convert_zero_rate_is_guarded() {
        assert_eq!(convert(0.0, 50.0, EditedField::To), None);
        // Multiplying by zero is well-defined and allowed.
        assert_eq!(convert(0.0, 50.0, EditedField::From), Some(0.0));
    }

    #[test]
    fn test_conversion_rate_wire_names() {
        let rate: ConversionRate = serde_json::from_str(r#"{"id":"USD_EUR","val":0.85}"#).unwrap();
        assert_eq!(rate.pair_id, "USD_EUR");
        assert_relative_eq!(rate.value, 0.85);
    }
}

//! Forgiving number parsing for judge input.
//!
//! Field sheets are typed in a hurry: blanks, `null`, text and decimal commas
//! all show up. Anything that is not a usable non-negative number reads as 0
//! instead of rejecting the whole request.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a measurement
pub fn number_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() && n >= 0.0 => n,
        _ => 0.0,
    }
}

/// `deserialize_with` helper for measurement fields
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(number_or_zero).unwrap_or(0.0))
}

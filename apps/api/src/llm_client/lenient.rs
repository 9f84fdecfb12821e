//! Serde helpers for model output, where numbers sometimes arrive as
//! strings ("82", "75%") or go missing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A number, a numeric string, or nothing.
pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Like `optional_number`, reading anything unusable as 0.
pub fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?.unwrap_or(0.0))
}

/// Clamps to 0–100; NaN and infinities become 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// A 0–100 integer score.
pub fn score(value: f64) -> i32 {
    clamp_percent(value).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "optional_number")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "number_or_zero")]
        fallback: f64,
    }

    fn probe(v: Value) -> Probe {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(probe(json!({ "value": "82" })).value, Some(82.0));
        assert_eq!(probe(json!({ "value": " 75% " })).value, Some(75.0));
        assert_eq!(probe(json!({ "value": 61.5 })).value, Some(61.5));
    }

    #[test]
    fn test_unusable_values() {
        let p = probe(json!({ "value": "high", "fallback": null }));
        assert_eq!(p.value, None);
        assert_eq!(p.fallback, 0.0);
        assert_eq!(probe(json!({})).fallback, 0.0);
        assert_eq!(probe(json!({ "value": [1] })).value, None);
    }

    #[test]
    fn test_score_clamps_and_rounds() {
        assert_eq!(score(101.0), 100);
        assert_eq!(score(-3.0), 0);
        assert_eq!(score(72.5), 73);
        assert_eq!(score(f64::NAN), 0);
    }
}

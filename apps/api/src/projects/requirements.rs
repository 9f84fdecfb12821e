//! Role requirements as stored in `project_roles.requirements`.
//!
//! Two spellings exist in stored data: the project form writes
//! `height_min`/`height_max` with a `height_unit`, older rows use camelCase
//! `minHeight`/`maxHeight` in centimetres. They land in separate fields, so a
//! row carrying both still parses; the form keys win when both are set.
//! Numbers may be numeric strings; zero bounds mean "unset". Every field is
//! parsed leniently so one odd value never drops the rest of the row.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

const CM_PER_INCH: f64 = 2.54;
const CM_PER_FOOT: f64 = 30.48;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleRequirements {
    /// Centimetres.
    #[serde(
        default,
        alias = "minHeight",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_height: Option<f64>,

    #[serde(
        default,
        alias = "maxHeight",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_height: Option<f64>,

    /// Form bound, in `height_unit`.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub height_min: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub height_max: Option<f64>,

    /// `cm` (default), `in` or `ft`. Applies to the form bounds only.
    #[serde(
        default,
        alias = "heightUnit",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub height_unit: Option<String>,

    #[serde(
        default,
        alias = "minWeight",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_weight_kg: Option<f64>,

    #[serde(
        default,
        alias = "maxWeight",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_weight_kg: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight_min: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight_max: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender: Option<Vec<String>>,

    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethnicity: Option<Vec<String>>,

    #[serde(
        default,
        alias = "looksTypes",
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub looks_types: Option<Vec<String>>,

    #[serde(
        default,
        alias = "hairColor",
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub hair_color: Option<Vec<String>>,

    #[serde(
        default,
        alias = "eyeColor",
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub eye_color: Option<Vec<String>>,

    #[serde(
        default,
        alias = "ageMin",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub age_min: Option<f64>,

    #[serde(
        default,
        alias = "ageMax",
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub age_max: Option<f64>,

    #[serde(
        default,
        alias = "vocalProfile",
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub vocal_profile: Option<Vec<String>>,

    #[serde(
        default,
        alias = "requiredSkills",
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    pub required_skills: Option<Vec<String>>,

    /// Keys this service does not interpret, kept for prompts and round-trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoleRequirements {
    /// Reads requirements from a role's JSON column. Malformed JSON yields no requirements.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::default(),
            Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
                warn!("Ignoring malformed role requirements: {e}");
                Self::default()
            }),
        }
    }

    fn height_factor(&self) -> f64 {
        match self
            .height_unit
            .as_deref()
            .map(|u| u.trim().to_lowercase())
            .as_deref()
        {
            Some("in") | Some("inch") | Some("inches") => CM_PER_INCH,
            Some("ft") | Some("feet") | Some("foot") => CM_PER_FOOT,
            _ => 1.0,
        }
    }

    pub fn min_height_cm(&self) -> Option<f64> {
        self.height_min
            .map(|h| h * self.height_factor())
            .or(self.min_height)
    }

    pub fn max_height_cm(&self) -> Option<f64> {
        self.height_max
            .map(|h| h * self.height_factor())
            .or(self.max_height)
    }

    pub fn min_weight(&self) -> Option<f64> {
        self.weight_min.or(self.min_weight_kg)
    }

    pub fn max_weight(&self) -> Option<f64> {
        self.weight_max.or(self.max_weight_kg)
    }

    /// Compact JSON used inside prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite() && *n > 0.0))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items: Vec<String> = match value {
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Ok((!items.is_empty()).then_some(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_keys() {
        let req = RoleRequirements::from_json(Some(&json!({
            "minHeight": 170,
            "maxHeight": 190,
            "minWeight": 60,
            "gender": "female",
            "looksTypes": ["girl next door", "athletic"],
            "hairColor": ["brown", "black"]
        })));
        assert_eq!(req.min_height_cm(), Some(170.0));
        assert_eq!(req.max_height_cm(), Some(190.0));
        assert_eq!(req.min_weight(), Some(60.0));
        assert_eq!(req.gender, Some(vec!["female".to_string()]));
        assert_eq!(req.looks_types.as_ref().map(Vec::len), Some(2));
        assert_eq!(req.hair_color.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_form_keys_with_feet() {
        let req = RoleRequirements::from_json(Some(&json!({
            "height_min": "5.5",
            "height_max": 6,
            "height_unit": "ft",
            "age_min": 25,
            "age_max": null,
            "required_skills": ["horse riding"]
        })));
        let min = req.min_height_cm().unwrap();
        assert!((min - 167.64).abs() < 0.01);
        assert!((req.max_height_cm().unwrap() - 182.88).abs() < 0.01);
        assert_eq!(req.age_min, Some(25.0));
        assert_eq!(req.age_max, None);
        assert_eq!(req.required_skills, Some(vec!["horse riding".to_string()]));
    }

    #[test]
    fn test_zero_and_blank_are_unset() {
        let req = RoleRequirements::from_json(Some(&json!({
            "minHeight": 0,
            "gender": [],
            "eyeColor": "  "
        })));
        assert_eq!(req.min_height, None);
        assert_eq!(req.gender, None);
        assert_eq!(req.eye_color, None);
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let req = RoleRequirements::from_json(Some(&json!({
            "accent": "Irish",
            "minHeight": 160
        })));
        assert_eq!(req.extra.get("accent"), Some(&json!("Irish")));
        let rendered = req.to_prompt_json();
        assert!(rendered.contains("Irish"));
        assert!(rendered.contains("min_height"));
    }

    #[test]
    fn test_project_form_shape() {
        let req = RoleRequirements::from_json(Some(&json!({
            "age_min": null,
            "age_max": null,
            "height_min": 185,
            "height_max": null,
            "height_unit": "cm",
            "vocal_profile": [],
            "required_skills": []
        })));
        assert_eq!(req.min_height_cm(), Some(185.0));
        assert_eq!(req.max_height_cm(), None);
        assert_eq!(req.vocal_profile, None);

        let req = RoleRequirements::from_json(Some(&json!({
            "height_min": 170,
            "vocal_profile": ["Baritone", "Tenor"],
            "height_unit": ["cm"]
        })));
        assert_eq!(req.min_height_cm(), Some(170.0));
        assert_eq!(req.vocal_profile.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_both_spellings_in_one_row() {
        let req = RoleRequirements::from_json(Some(&json!({
            "minHeight": 185,
            "height_min": 185,
            "maxWeight": 90,
            "weight_max": 80
        })));
        assert_eq!(req.min_height_cm(), Some(185.0));
        assert_eq!(req.max_weight(), Some(80.0));

        let req = RoleRequirements::from_json(Some(&json!({
            "minHeight": 150,
            "height_min": 6,
            "height_unit": "ft"
        })));
        assert!((req.min_height_cm().unwrap() - 182.88).abs() < 0.01);
    }

    #[test]
    fn test_null_and_garbage() {
        assert_eq!(RoleRequirements::from_json(None), RoleRequirements::default());
        assert_eq!(
            RoleRequirements::from_json(Some(&Value::Null)),
            RoleRequirements::default()
        );
        assert_eq!(
            RoleRequirements::from_json(Some(&json!("tall"))),
            RoleRequirements::default()
        );
    }
}

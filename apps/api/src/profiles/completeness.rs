use serde::{Deserialize, Serialize};

use crate::models::profile::TalentProfileRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Complete,
    Strong,
    Partial,
    Sparse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReport {
    pub percentage: i32,
    pub filled: usize,
    pub total: usize,
    pub missing_fields: Vec<String>,
    pub status: CompletionStatus,
}

/// The fields that make a talent profile castable, in display order.
const PROFILE_FIELDS: &[&str] = &[
    "height",
    "weight",
    "hair_color",
    "eye_color",
    "gender_identity",
    "ethnicity",
    "looks_types",
    "languages",
    "special_skills",
    "location",
    "union_status",
    "media",
];

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn has_items(value: &Option<Vec<String>>) -> bool {
    value.as_ref().is_some_and(|v| v.iter().any(|s| !s.trim().is_empty()))
}

/// Height and weight count when given in either unit system.
fn is_filled(field: &str, t: &TalentProfileRow, media_count: usize) -> bool {
    match field {
        "height" => t.height_cm.is_some() || t.height_feet.is_some(),
        "weight" => t.weight_kg.is_some() || t.weight.is_some(),
        "hair_color" => has_text(&t.hair_color),
        "eye_color" => has_text(&t.eye_color),
        "gender_identity" => has_text(&t.gender_identity),
        "ethnicity" => has_items(&t.ethnicity),
        "looks_types" => has_items(&t.looks_types),
        "languages" => has_items(&t.languages),
        "special_skills" => has_items(&t.special_skills),
        "location" => has_text(&t.location),
        "union_status" => has_text(&t.union_status),
        "media" => media_count > 0,
        _ => false,
    }
}

pub fn compute_completion_report(talent: &TalentProfileRow, media_count: usize) -> CompletionReport {
    let total = PROFILE_FIELDS.len();
    let missing_fields: Vec<String> = PROFILE_FIELDS
        .iter()
        .filter(|field| !is_filled(field, talent, media_count))
        .map(|field| field.to_string())
        .collect();
    let filled = total - missing_fields.len();
    let percentage = ((filled as f64 / total as f64) * 100.0).round() as i32;

    let status = match percentage {
        100 => CompletionStatus::Complete,
        75..=99 => CompletionStatus::Strong,
        40..=74 => CompletionStatus::Partial,
        _ => CompletionStatus::Sparse,
    };

    CompletionReport {
        percentage,
        filled,
        total,
        missing_fields,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let report = compute_completion_report(&TalentProfileRow::default(), 0);
        assert_eq!(report.percentage, 0);
        assert_eq!(report.total, 12);
        assert_eq!(report.missing_fields.len(), 12);
        assert_eq!(report.status, CompletionStatus::Sparse);
    }

    #[test]
    fn test_full_profile() {
        let s = |v: &str| Some(v.to_string());
        let l = |v: &str| Some(vec![v.to_string()]);
        let talent = TalentProfileRow {
            height_feet: Some(5),
            weight_kg: Some(60),
            hair_color: s("red"),
            eye_color: s("blue"),
            gender_identity: s("female"),
            ethnicity: l("Irish"),
            looks_types: l("quirky"),
            languages: l("English"),
            special_skills: l("Juggling"),
            location: s("Dublin"),
            union_status: s("Equity"),
            ..Default::default()
        };
        let report = compute_completion_report(&talent, 2);
        assert_eq!(report.percentage, 100);
        assert!(report.missing_fields.is_empty());
        assert_eq!(report.status, CompletionStatus::Complete);
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let talent = TalentProfileRow {
            hair_color: Some("   ".to_string()),
            languages: Some(vec!["".to_string()]),
            height_cm: Some(170),
            ..Default::default()
        };
        let report = compute_completion_report(&talent, 0);
        assert_eq!(report.filled, 1);
        assert_eq!(report.percentage, 8);
        assert!(report.missing_fields.contains(&"hair_color".to_string()));
        assert!(report.missing_fields.contains(&"languages".to_string()));
        assert!(!report.missing_fields.contains(&"height".to_string()));
    }
}

//! Human-readable physical descriptions for prompts. Metric values win;
//! imperial form fields are the fallback.

use crate::llm_client::prompts::NOT_AVAILABLE;
use crate::models::profile::TalentProfileRow;

pub fn describe_height(talent: &TalentProfileRow) -> String {
    if let Some(cm) = talent.height_cm {
        return format!("{cm} cm");
    }
    match (talent.height_feet, talent.height_inches) {
        (Some(ft), inches) => format!("{ft}'{}\"", inches.unwrap_or(0)),
        (None, Some(inches)) => format!("{inches}\""),
        (None, None) => NOT_AVAILABLE.to_string(),
    }
}

pub fn describe_weight(talent: &TalentProfileRow) -> String {
    match (talent.weight_kg, talent.weight) {
        (Some(kg), _) => format!("{kg} kg"),
        (None, Some(lbs)) => format!("{lbs} lbs"),
        (None, None) => NOT_AVAILABLE.to_string(),
    }
}

/// One-line appearance summary: ethnicity, hair, eyes.
pub fn describe_appearance(talent: &TalentProfileRow) -> String {
    let ethnicity = talent
        .ethnicity
        .as_ref()
        .filter(|e| !e.is_empty())
        .map(|e| e.join("/"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    format!(
        "{ethnicity}, {} hair, {} eyes",
        talent.hair_color.as_deref().unwrap_or(NOT_AVAILABLE),
        talent.eye_color.as_deref().unwrap_or(NOT_AVAILABLE)
    )
}

/// Counts of each skill list, used where the prompt wants breadth, not detail.
pub fn describe_skill_counts(talent: &TalentProfileRow) -> String {
    let count = |v: &Option<Vec<String>>| v.as_ref().map_or(0, Vec::len);
    format!(
        "Languages({}), Instruments({}), Combat({}), Athletic({}), Special({})",
        count(&talent.languages),
        count(&talent.instruments),
        count(&talent.combat_skills),
        count(&talent.athletic_skills),
        count(&talent.special_skills)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_preferred() {
        let talent = TalentProfileRow {
            height_cm: Some(178),
            height_feet: Some(5),
            height_inches: Some(10),
            weight_kg: Some(70),
            weight: Some(154),
            ..Default::default()
        };
        assert_eq!(describe_height(&talent), "178 cm");
        assert_eq!(describe_weight(&talent), "70 kg");
    }

    #[test]
    fn test_imperial_fallback() {
        let talent = TalentProfileRow {
            height_feet: Some(6),
            weight: Some(180),
            ..Default::default()
        };
        assert_eq!(describe_height(&talent), "6'0\"");
        assert_eq!(describe_weight(&talent), "180 lbs");
    }

    #[test]
    fn test_missing_everything() {
        let talent = TalentProfileRow::default();
        assert_eq!(describe_height(&talent), "N/A");
        assert_eq!(describe_weight(&talent), "N/A");
        assert_eq!(describe_appearance(&talent), "N/A, N/A hair, N/A eyes");
    }

    #[test]
    fn test_skill_counts() {
        let talent = TalentProfileRow {
            languages: Some(vec!["English".into(), "French".into()]),
            combat_skills: Some(vec!["Stage combat".into()]),
            ..Default::default()
        };
        assert_eq!(
            describe_skill_counts(&talent),
            "Languages(2), Instruments(0), Combat(1), Athletic(0), Special(0)"
        );
    }
}

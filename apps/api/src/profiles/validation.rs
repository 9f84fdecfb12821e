//! Field validation for profile updates.

use crate::errors::AppError;

pub const HEIGHT_CM_RANGE: (i32, i32) = (50, 250);
pub const WEIGHT_KG_RANGE: (i32, i32) = (20, 300);
pub const MATCHING_SENSITIVITIES: &[&str] = &["low", "medium", "high"];

pub fn validate_range(field: &str, value: Option<i32>, (min, max): (i32, i32)) -> Result<(), AppError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(AppError::Validation(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

/// A present-but-blank value is rejected; absent values are fine.
pub fn validate_not_blank(field: &str, value: Option<&str>) -> Result<(), AppError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(AppError::Validation(format!("{field} cannot be blank")))
        }
        _ => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("Invalid email address: {email}"))),
    }
}

pub fn validate_sensitivity(value: &str) -> Result<(), AppError> {
    if MATCHING_SENSITIVITIES.contains(&value) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "ai_matching_sensitivity must be one of {}",
            MATCHING_SENSITIVITIES.join(", ")
        )))
    }
}

/// Trims each entry and drops blanks.
pub fn clean_list(items: Option<Vec<String>>) -> Option<Vec<String>> {
    items.map(|v| {
        v.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_inclusive() {
        assert!(validate_range("height_cm", Some(50), HEIGHT_CM_RANGE).is_ok());
        assert!(validate_range("height_cm", Some(250), HEIGHT_CM_RANGE).is_ok());
        assert!(validate_range("height_cm", Some(251), HEIGHT_CM_RANGE).is_err());
        assert!(validate_range("weight_kg", Some(19), WEIGHT_KG_RANGE).is_err());
        assert!(validate_range("weight_kg", None, WEIGHT_KG_RANGE).is_ok());
    }

    #[test]
    fn test_blank() {
        assert!(validate_not_blank("full_name", Some("  ")).is_err());
        assert!(validate_not_blank("full_name", Some("Ana")).is_ok());
        assert!(validate_not_blank("full_name", None).is_ok());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("casting@studio.com").is_ok());
        assert!(validate_email("casting.studio.com").is_err());
        assert!(validate_email("@studio.com").is_err());
        assert!(validate_email("casting@").is_err());
    }

    #[test]
    fn test_sensitivity() {
        assert!(validate_sensitivity("high").is_ok());
        assert!(validate_sensitivity("extreme").is_err());
    }

    #[test]
    fn test_clean_list() {
        let cleaned = clean_list(Some(vec![" French ".into(), "".into(), "ASL".into()]));
        assert_eq!(cleaned, Some(vec!["French".to_string(), "ASL".to_string()]));
        assert_eq!(clean_list(None), None);
    }
}

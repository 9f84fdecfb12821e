//! Physical pre-filter. Runs before any model call.
//!
//! A check only applies when both the requirement and the talent attribute
//! are present; missing data never disqualifies. String comparisons are
//! case-insensitive.

use uuid::Uuid;

use crate::models::profile::TalentProfileRow;
use crate::models::project::ProjectRoleRow;
use crate::projects::requirements::RoleRequirements;

/// Requirements that apply to an application: the applied role's, or every
/// role's when the application names no role (or an unknown one).
pub fn requirements_for_application(
    role_id: Option<Uuid>,
    roles: &[ProjectRoleRow],
) -> Vec<RoleRequirements> {
    let applied = role_id.and_then(|id| roles.iter().find(|r| r.id == id));
    match applied {
        Some(role) => vec![RoleRequirements::from_json(role.requirements.as_ref())],
        None => roles
            .iter()
            .map(|r| RoleRequirements::from_json(r.requirements.as_ref()))
            .collect(),
    }
}

/// Returns the reasons an applicant fails the requirements. Empty means qualified.
pub fn rejection_reasons(
    talent: Option<&TalentProfileRow>,
    requirements: &[RoleRequirements],
) -> Vec<String> {
    let Some(talent) = talent else {
        return Vec::new();
    };

    let mut reasons: Vec<String> = Vec::new();
    let mut push = |reason: String| {
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    };

    for req in requirements {
        if let Some(height) = talent.height_cm.map(f64::from) {
            if let Some(min) = req.min_height_cm() {
                if height < min {
                    push(format!(
                        "Height below minimum ({}cm required)",
                        format_measure(min)
                    ));
                }
            }
            if let Some(max) = req.max_height_cm() {
                if height > max {
                    push(format!(
                        "Height above maximum ({}cm required)",
                        format_measure(max)
                    ));
                }
            }
        }

        if let Some(weight) = talent.weight_kg.map(f64::from) {
            if let Some(min) = req.min_weight() {
                if weight < min {
                    push(format!(
                        "Weight below minimum ({}kg required)",
                        format_measure(min)
                    ));
                }
            }
            if let Some(max) = req.max_weight() {
                if weight > max {
                    push(format!(
                        "Weight above maximum ({}kg required)",
                        format_measure(max)
                    ));
                }
            }
        }

        if !single_matches(talent.gender_identity.as_deref(), req.gender.as_deref()) {
            push("Gender doesn't match role requirements".to_string());
        }
        if !any_overlap(talent.ethnicity.as_deref(), req.ethnicity.as_deref()) {
            push("Ethnicity doesn't match role requirements".to_string());
        }
        if !any_overlap(talent.looks_types.as_deref(), req.looks_types.as_deref()) {
            push("Physical type doesn't match role requirements".to_string());
        }
        if !single_matches(talent.hair_color.as_deref(), req.hair_color.as_deref()) {
            push("Hair color doesn't match role requirements".to_string());
        }
        if !single_matches(talent.eye_color.as_deref(), req.eye_color.as_deref()) {
            push("Eye color doesn't match role requirements".to_string());
        }
    }

    reasons
}

/// True unless both sides are present and the value is not among the allowed ones.
fn single_matches(value: Option<&str>, allowed: Option<&[String]>) -> bool {
    match (value.map(str::trim).filter(|v| !v.is_empty()), allowed) {
        (Some(value), Some(allowed)) if !allowed.is_empty() => {
            allowed.iter().any(|a| a.trim().eq_ignore_ascii_case(value))
        }
        _ => true,
    }
}

/// True unless both lists are non-empty and share no element.
fn any_overlap(values: Option<&[String]>, allowed: Option<&[String]>) -> bool {
    match (values, allowed) {
        (Some(values), Some(allowed)) if !values.is_empty() && !allowed.is_empty() => values
            .iter()
            .any(|v| allowed.iter().any(|a| a.trim().eq_ignore_ascii_case(v.trim()))),
        _ => true,
    }
}

fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

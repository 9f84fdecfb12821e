//! Model output shapes for the matching endpoints and the clean-up applied
//! before they reach a client.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::llm_client::lenient::{number_or_zero, score};
use crate::models::project::{ProjectRoleRow, ProjectRow};

pub const DEFAULT_RECOMMENDATIONS: i64 = 10;
pub const MAX_RECOMMENDATIONS: i64 = 50;
/// Profiles shown to the model per recommendation request.
pub const TALENT_POOL_SIZE: i64 = 50;

// ─── Profile analysis ─────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawProfileAnalysis {
    #[serde(alias = "overallScore", deserialize_with = "number_or_zero")]
    pub overall_score: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub completeness: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub marketability: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(alias = "priorityActions")]
    pub priority_actions: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnalysis {
    pub overall_score: i32,
    pub completeness: i32,
    pub marketability: i32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub priority_actions: Vec<String>,
    pub summary: String,
}

impl From<RawProfileAnalysis> for ProfileAnalysis {
    fn from(raw: RawProfileAnalysis) -> Self {
        Self {
            overall_score: score(raw.overall_score),
            completeness: score(raw.completeness),
            marketability: score(raw.marketability),
            strengths: clean(raw.strengths),
            improvements: clean(raw.improvements),
            priority_actions: clean(raw.priority_actions),
            summary: raw.summary.trim().to_string(),
        }
    }
}

// ─── Talent-role match ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawTalentMatch {
    #[serde(alias = "matchScore", deserialize_with = "number_or_zero")]
    pub match_score: f64,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentMatch {
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

impl From<RawTalentMatch> for TalentMatch {
    fn from(raw: RawTalentMatch) -> Self {
        Self {
            match_score: score(raw.match_score),
            strengths: clean(raw.strengths),
            concerns: clean(raw.concerns),
            recommendation: raw.recommendation.trim().to_string(),
        }
    }
}

// ─── Candidate recommendations ────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRecommendationSet {
    pub recommendations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawRecommendation {
    #[serde(alias = "talentId")]
    pub talent_id: String,
    #[serde(default, alias = "matchScore", deserialize_with = "number_or_zero")]
    pub match_score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, alias = "keyStrengths")]
    pub key_strengths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecommendation {
    pub talent_id: Uuid,
    pub talent_name: String,
    pub avatar_url: Option<String>,
    pub match_score: i32,
    pub reasoning: String,
    pub key_strengths: Vec<String>,
}

/// Number of recommendations to return, defaulting to 10 and capped at 50.
pub fn recommendation_limit(requested: Option<i64>) -> usize {
    requested
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS) as usize
}

/// Keeps recommendations that name a talent from the pool, once each,
/// best first, at most `limit`. Names are filled in later.
pub fn filter_recommendations(
    raw: RawRecommendationSet,
    pool: &HashSet<Uuid>,
    limit: usize,
) -> Vec<CandidateRecommendation> {
    let mut seen = HashSet::new();
    let mut kept: Vec<CandidateRecommendation> = raw
        .recommendations
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawRecommendation>(item) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Skipping malformed recommendation: {e}");
                None
            }
        })
        .filter_map(|r| {
            let talent_id = match Uuid::parse_str(r.talent_id.trim()) {
                Ok(id) if pool.contains(&id) => id,
                _ => {
                    warn!("Discarding recommendation for unknown talent '{}'", r.talent_id);
                    return None;
                }
            };
            seen.insert(talent_id).then(|| CandidateRecommendation {
                talent_id,
                talent_name: String::new(),
                avatar_url: None,
                match_score: score(r.match_score),
                reasoning: r.reasoning.trim().to_string(),
                key_strengths: clean(r.key_strengths),
            })
        })
        .collect();

    kept.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    kept.truncate(limit);
    kept
}

// ─── Role description for applicants ──────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewordedDescription {
    pub original_description: String,
    pub reworded_description: String,
    /// False when the model was unavailable and the original is returned.
    pub reworded: bool,
}

impl RewordedDescription {
    pub fn unchanged(original: String) -> Self {
        Self {
            reworded_description: original.clone(),
            original_description: original,
            reworded: false,
        }
    }
}

/// The casting call as a director wrote it: one role's description, a
/// listing of several roles, the project description, or a generic call.
pub fn compose_role_description(project: &ProjectRow, roles: &[ProjectRoleRow]) -> String {
    let description = non_blank(project.description.as_deref());

    match roles {
        [role] => match non_blank(role.role_description.as_deref()) {
            Some(text) => text.to_string(),
            None => format!(
                "We are casting for {}. {}",
                role.role_name,
                description.unwrap_or_default()
            )
            .trim_end()
            .to_string(),
        },
        [_, _, ..] => {
            let listing = roles
                .iter()
                .map(|r| {
                    format!(
                        "{}: {}",
                        r.role_name,
                        non_blank(r.role_description.as_deref())
                            .unwrap_or("No specific requirements listed")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            match description {
                Some(d) => format!("Multiple roles available:\n\n{listing}\n\n{d}"),
                None => format!("Multiple roles available:\n\n{listing}"),
            }
        }
        [] => match description {
            Some(d) => d.to_string(),
            None => format!(
                "We're looking for talented performers for our {} project: {}. \
                 Please showcase your best work in your audition video.",
                project.project_type, project.title
            ),
        },
    }
}

/// Trims a model reply and strips wrapping quotes. `None` when nothing is left.
pub fn clean_reworded(reply: &str) -> Option<String> {
    let text = reply.trim();
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn project(description: Option<&str>) -> ProjectRow {
        ProjectRow {
            id: Uuid::new_v4(),
            director_id: Uuid::new_v4(),
            title: "Salt Road".to_string(),
            project_type: "short_film".to_string(),
            description: description.map(str::to_string),
            production_company: None,
            location: None,
            deadline: None,
            shoot_start_date: None,
            shoot_end_date: None,
            remote_auditions_only: true,
            mood_board_urls: None,
            is_draft: false,
            status: "open".to_string(),
            selected_talent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn role(name: &str, description: Option<&str>) -> ProjectRoleRow {
        ProjectRoleRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_name: name.to_string(),
            role_description: description.map(str::to_string),
            emotions: None,
            requirements: None,
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_single_role_uses_its_description() {
        let text = compose_role_description(
            &project(Some("A coastal drama.")),
            &[role("Mara", Some("A weathered fisherwoman."))],
        );
        assert_eq!(text, "A weathered fisherwoman.");
    }

    #[test]
    fn test_single_role_without_description() {
        let text = compose_role_description(&project(Some("A coastal drama.")), &[role("Mara", None)]);
        assert_eq!(text, "We are casting for Mara. A coastal drama.");

        let text = compose_role_description(&project(None), &[role("Mara", Some("  "))]);
        assert_eq!(text, "We are casting for Mara.");
    }

    #[test]
    fn test_multiple_roles_listed() {
        let text = compose_role_description(
            &project(Some("A coastal drama.")),
            &[role("Mara", Some("Lead.")), role("Tom", None)],
        );
        assert_eq!(
            text,
            "Multiple roles available:\n\nMara: Lead.\n\nTom: No specific requirements listed\n\nA coastal drama."
        );
    }

    #[test]
    fn test_no_roles_falls_back() {
        assert_eq!(
            compose_role_description(&project(Some("A coastal drama.")), &[]),
            "A coastal drama."
        );
        assert_eq!(
            compose_role_description(&project(None), &[]),
            "We're looking for talented performers for our short_film project: Salt Road. \
             Please showcase your best work in your audition video."
        );
    }

    #[test]
    fn test_filter_recommendations() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pool: HashSet<Uuid> = [a, b].into_iter().collect();
        let raw: RawRecommendationSet = serde_json::from_value(json!({
            "recommendations": [
                { "talentId": a.to_string(), "matchScore": 71, "reasoning": " Strong fit ", "keyStrengths": ["Voice", ""] },
                { "talentId": Uuid::new_v4().to_string(), "matchScore": 99 },
                { "talentId": "not-a-uuid", "matchScore": 95 },
                { "talentId": b.to_string(), "matchScore": "88" },
                { "talentId": a.to_string(), "matchScore": 10 },
                { "matchScore": 50 }
            ]
        }))
        .unwrap();

        let kept = filter_recommendations(raw, &pool, 10);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].talent_id, b);
        assert_eq!(kept[0].match_score, 88);
        assert_eq!(kept[1].talent_id, a);
        assert_eq!(kept[1].match_score, 71);
        assert_eq!(kept[1].reasoning, "Strong fit");
        assert_eq!(kept[1].key_strengths, vec!["Voice".to_string()]);
    }

    #[test]
    fn test_filter_recommendations_truncates() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let pool: HashSet<Uuid> = ids.iter().copied().collect();
        let raw = RawRecommendationSet {
            recommendations: ids
                .iter()
                .enumerate()
                .map(|(i, id)| json!({ "talent_id": id, "match_score": 50 + i }))
                .collect(),
        };
        let kept = filter_recommendations(raw, &pool, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].talent_id, ids[4]);
        assert_eq!(kept[1].talent_id, ids[3]);
    }

    #[test]
    fn test_recommendation_limit() {
        assert_eq!(recommendation_limit(None), 10);
        assert_eq!(recommendation_limit(Some(0)), 1);
        assert_eq!(recommendation_limit(Some(500)), 50);
        assert_eq!(recommendation_limit(Some(7)), 7);
    }

    #[test]
    fn test_profile_analysis_clamped() {
        let raw: RawProfileAnalysis = serde_json::from_value(json!({
            "overallScore": 112,
            "completeness": "64.6",
            "strengths": ["Headshots", " "],
            "priorityActions": ["Add a reel"],
            "summary": " Promising. "
        }))
        .unwrap();
        let analysis = ProfileAnalysis::from(raw);
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.completeness, 65);
        assert_eq!(analysis.marketability, 0);
        assert_eq!(analysis.strengths, vec!["Headshots".to_string()]);
        assert_eq!(analysis.priority_actions, vec!["Add a reel".to_string()]);
        assert_eq!(analysis.summary, "Promising.");
    }

    #[test]
    fn test_talent_match_parsed() {
        let raw: RawTalentMatch = serde_json::from_value(json!({
            "matchScore": 77.4,
            "concerns": ["Based abroad"],
            "recommendation": "Invite to callback"
        }))
        .unwrap();
        let m = TalentMatch::from(raw);
        assert_eq!(m.match_score, 77);
        assert!(m.strengths.is_empty());
        assert_eq!(m.concerns, vec!["Based abroad".to_string()]);
    }

    #[test]
    fn test_clean_reworded() {
        assert_eq!(clean_reworded("  \"Come as you are.\" \n"), Some("Come as you are.".to_string()));
        assert_eq!(clean_reworded("Plain text"), Some("Plain text".to_string()));
        assert_eq!(clean_reworded(" \"\" "), None);
        assert_eq!(clean_reworded(""), None);
    }
}

//! Applicant scoring: pluggable, trait-based scorer that rates qualified
//! applicants against a project's roles.
//!
//! `AppState` holds an `Arc<dyn ApplicantScorer>`; the default backend is
//! `LlmApplicantScorer`. Tests swap in a fixed scorer.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{LlmCall, LlmClient};
use crate::models::project::{ProjectRoleRow, ProjectRow};
use crate::shortlist::prompts::{build_shortlist_prompt, shortlist_system};
use crate::shortlist::Candidate;

/// Minimum score for an applicant to make the AI shortlist.
pub const SHORTLIST_THRESHOLD: i32 = 50;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One evaluation as returned by a scorer backend. Field names follow the
/// model's camelCase output; snake_case is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantEvaluation {
    #[serde(alias = "applicationId")]
    pub application_id: Uuid,
    #[serde(alias = "matchScore", deserialize_with = "score_from_number")]
    pub match_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

/// An evaluation after validation: known application, integer score in 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredApplicant {
    pub application_id: Uuid,
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ApplicantScorer: Send + Sync {
    async fn score(
        &self,
        project: &ProjectRow,
        roles: &[ProjectRoleRow],
        candidates: &[Candidate],
    ) -> Result<Vec<ApplicantEvaluation>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmApplicantScorer
// ────────────────────────────────────────────────────────────────────────────

/// Scores every candidate in one text-model call.
pub struct LlmApplicantScorer(pub LlmClient);

#[async_trait]
impl ApplicantScorer for LlmApplicantScorer {
    async fn score(
        &self,
        project: &ProjectRow,
        roles: &[ProjectRoleRow],
        candidates: &[Candidate],
    ) -> Result<Vec<ApplicantEvaluation>, AppError> {
        let system = shortlist_system();
        let prompt = build_shortlist_prompt(project, roles, candidates);

        let items: Vec<Value> = self
            .0
            .call_json_array(LlmCall::text(&system, &prompt))
            .await
            .map_err(|e| AppError::Llm(format!("Shortlist evaluation failed: {e}")))?;

        Ok(parse_evaluations(items))
    }
}

/// Parses array items one at a time so a single malformed entry does not
/// sink the whole batch.
fn parse_evaluations(items: Vec<Value>) -> Vec<ApplicantEvaluation> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ApplicantEvaluation>(item) {
            Ok(eval) => Some(eval),
            Err(e) => {
                warn!("Skipping malformed applicant evaluation: {e}");
                None
            }
        })
        .collect()
}

fn score_from_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("score is not a finite number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("score is not numeric: {s}"))),
        other => Err(serde::de::Error::custom(format!(
            "expected a numeric score, got {other}"
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Post-processing
// ────────────────────────────────────────────────────────────────────────────

/// Keeps evaluations for known applications only (first one wins on
/// duplicates), clamping scores to 0–100 and rounding to an integer.
pub fn normalize_evaluations(
    evaluations: Vec<ApplicantEvaluation>,
    known_ids: &HashSet<Uuid>,
) -> Vec<ScoredApplicant> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut scored = Vec::with_capacity(evaluations.len());

    for eval in evaluations {
        if !known_ids.contains(&eval.application_id) {
            warn!(
                "Discarding evaluation for unknown application {}",
                eval.application_id
            );
            continue;
        }
        if !seen.insert(eval.application_id) {
            debug!("Duplicate evaluation for {} ignored", eval.application_id);
            continue;
        }
        let score = if eval.match_score.is_finite() {
            eval.match_score.clamp(0.0, 100.0).round() as i32
        } else {
            0
        };
        scored.push(ScoredApplicant {
            application_id: eval.application_id,
            match_score: score,
            strengths: eval.strengths,
            concerns: eval.concerns,
            recommendation: eval.recommendation,
        });
    }

    scored
}

/// Applicants at or above the threshold, best first. Ties keep model order.
pub fn shortlist_cut(scored: &[ScoredApplicant]) -> Vec<ScoredApplicant> {
    let mut passing: Vec<ScoredApplicant> = scored
        .iter()
        .filter(|s| s.match_score >= SHORTLIST_THRESHOLD)
        .cloned()
        .collect();
    passing.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    passing
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(id: Uuid, score: f64) -> ApplicantEvaluation {
        ApplicantEvaluation {
            application_id: id,
            match_score: score,
            strengths: vec![],
            concerns: vec![],
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_parses_camel_and_snake_case() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_evaluations(vec![
            json!({ "applicationId": a, "matchScore": 81, "strengths": ["Presence"] }),
            json!({ "application_id": b, "match_score": "64.5", "recommendation": "Maybe" }),
        ]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].application_id, a);
        assert_eq!(parsed[0].strengths, vec!["Presence".to_string()]);
        assert_eq!(parsed[1].match_score, 64.5);
        assert!(parsed[1].concerns.is_empty());
    }

    #[test]
    fn test_malformed_items_skipped() {
        let ok = Uuid::new_v4();
        let parsed = parse_evaluations(vec![
            json!({ "applicationId": "not-a-uuid", "matchScore": 90 }),
            json!({ "applicationId": ok, "matchScore": null }),
            json!("free text"),
            json!({ "applicationId": ok, "matchScore": 70 }),
        ]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].match_score, 70.0);
    }

    #[test]
    fn test_unknown_ids_discarded() {
        let known = Uuid::new_v4();
        let ids: HashSet<Uuid> = [known].into_iter().collect();
        let scored = normalize_evaluations(vec![eval(Uuid::new_v4(), 99.0), eval(known, 60.0)], &ids);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].application_id, known);
    }

    #[test]
    fn test_scores_clamped_and_rounded() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ids: HashSet<Uuid> = [a, b, c].into_iter().collect();
        let scored = normalize_evaluations(vec![eval(a, 140.0), eval(b, -5.0), eval(c, 72.5)], &ids);
        let scores: Vec<i32> = scored.iter().map(|s| s.match_score).collect();
        assert_eq!(scores, vec![100, 0, 73]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let a = Uuid::new_v4();
        let ids: HashSet<Uuid> = [a].into_iter().collect();
        let scored = normalize_evaluations(vec![eval(a, 80.0), eval(a, 20.0)], &ids);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].match_score, 80);
    }

    #[test]
    fn test_cut_threshold_and_stable_order() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let scored: Vec<ScoredApplicant> = [(0, 70), (1, 49), (2, 90), (3, 70)]
            .iter()
            .map(|(i, s)| ScoredApplicant {
                application_id: ids[*i],
                match_score: *s,
                strengths: vec![],
                concerns: vec![],
                recommendation: String::new(),
            })
            .collect();

        let cut = shortlist_cut(&scored);
        let order: Vec<Uuid> = cut.iter().map(|s| s.application_id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[3]]);
    }

    #[test]
    fn test_exactly_fifty_makes_the_cut() {
        let scored = vec![ScoredApplicant {
            application_id: Uuid::new_v4(),
            match_score: 50,
            strengths: vec![],
            concerns: vec![],
            recommendation: String::new(),
        }];
        assert_eq!(shortlist_cut(&scored).len(), 1);
    }

    #[tokio::test]
    async fn test_llm_scorer_skips_malformed_entries() {
        let id = Uuid::new_v4();
        let reply = format!(
            "```json\n[{{\"applicationId\": \"{id}\", \"matchScore\": 77}}, {{\"note\": \"n/a\"}}]\n```"
        );
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [{ "message": { "content": reply } }] }).to_string())
            .create_async()
            .await;

        let llm = LlmClient::new(
            "test-key".into(),
            format!("{}/v1/chat/completions", server.url()),
        )
        .unwrap();
        let project = ProjectRow {
            id: Uuid::new_v4(),
            director_id: Uuid::new_v4(),
            title: "Lantern".to_string(),
            project_type: "commercial".to_string(),
            description: None,
            production_company: None,
            location: None,
            deadline: None,
            shoot_start_date: None,
            shoot_end_date: None,
            remote_auditions_only: false,
            mood_board_urls: None,
            is_draft: false,
            status: "open".to_string(),
            selected_talent_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let evaluations = LlmApplicantScorer(llm)
            .score(&project, &[], &[])
            .await
            .unwrap();
        assert_eq!(evaluations.len(), 1);
        assert_eq!(evaluations[0].application_id, id);
        assert_eq!(evaluations[0].match_score, 77.0);
        mock.assert_async().await;
    }
}

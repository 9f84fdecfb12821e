use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::auditions::evaluation::{AuditionEvaluation, NormalizedEvaluation};
use crate::auditions::prompts::{build_audition_prompt, AUDITION_MAX_TOKENS};
use crate::errors::AppError;
use crate::llm_client::LlmCall;
use crate::models::audition::{AuditionEvaluationRow, AuditionRow, AuditionStatus};
use crate::projects::repository::{fetch_role, require_project};
use crate::state::AppState;
use crate::storage::validate_object_key;

pub struct NewAudition {
    pub talent_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub role_description: String,
    pub emotional_keywords: Vec<String>,
    pub video_path: String,
}

impl NewAudition {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.role_description.trim().is_empty() {
            return Err(AppError::Validation(
                "role_description is required".to_string(),
            ));
        }
        validate_object_key("video_path", &self.video_path)
    }
}

#[derive(Debug, Serialize)]
pub struct AuditionWithEvaluation {
    #[serde(flatten)]
    pub audition: AuditionRow,
    pub evaluation: Option<AuditionEvaluationRow>,
}

pub async fn create_audition(pool: &PgPool, new: NewAudition) -> Result<AuditionRow, AppError> {
    new.validate()?;
    let project = require_project(pool, new.project_id).await?;
    if let Some(role_id) = new.role_id {
        let belongs = fetch_role(pool, role_id)
            .await?
            .is_some_and(|r| r.project_id == project.id);
        if !belongs {
            return Err(AppError::Validation(format!(
                "Role {role_id} does not belong to project {}",
                project.id
            )));
        }
    }

    let keywords: Vec<String> = new
        .emotional_keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    let audition: AuditionRow = sqlx::query_as(
        r#"
        INSERT INTO auditions
            (talent_id, project_id, role_id, role_description, emotional_keywords, video_url, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new.talent_id)
    .bind(project.id)
    .bind(new.role_id)
    .bind(new.role_description.trim())
    .bind(&keywords)
    .bind(new.video_path.trim())
    .bind(AuditionStatus::Pending.as_str())
    .fetch_one(pool)
    .await?;

    info!("Audition {} recorded for project {}", audition.id, project.id);
    Ok(audition)
}

pub async fn fetch_audition(pool: &PgPool, id: Uuid) -> Result<Option<AuditionRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM auditions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Latest evaluation per audition.
async fn latest_evaluations(
    pool: &PgPool,
    audition_ids: &[Uuid],
) -> Result<HashMap<Uuid, AuditionEvaluationRow>, sqlx::Error> {
    if audition_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<AuditionEvaluationRow> = sqlx::query_as(
        r#"
        SELECT DISTINCT ON (audition_id) *
        FROM audition_evaluations
        WHERE audition_id = ANY($1)
        ORDER BY audition_id, created_at DESC
        "#,
    )
    .bind(audition_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|e| (e.audition_id, e)).collect())
}

pub async fn get_audition(pool: &PgPool, id: Uuid) -> Result<AuditionWithEvaluation, AppError> {
    let audition = fetch_audition(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Audition {id} not found")))?;
    let evaluation = latest_evaluations(pool, &[id]).await?.remove(&id);
    Ok(AuditionWithEvaluation {
        audition,
        evaluation,
    })
}

pub async fn list_talent_auditions(
    pool: &PgPool,
    talent_id: Uuid,
) -> Result<Vec<AuditionWithEvaluation>, AppError> {
    let auditions: Vec<AuditionRow> =
        sqlx::query_as("SELECT * FROM auditions WHERE talent_id = $1 ORDER BY created_at DESC")
            .bind(talent_id)
            .fetch_all(pool)
            .await?;
    let ids: Vec<Uuid> = auditions.iter().map(|a| a.id).collect();
    let mut evaluations = latest_evaluations(pool, &ids).await?;
    Ok(auditions
        .into_iter()
        .map(|audition| {
            let evaluation = evaluations.remove(&audition.id);
            AuditionWithEvaluation {
                audition,
                evaluation,
            }
        })
        .collect())
}

async fn set_status(pool: &PgPool, id: Uuid, status: AuditionStatus) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE auditions SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Runs the vision model over an audition. The audition ends `completed`
/// with a stored evaluation, or `failed` when any step after `analyzing` fails.
pub async fn evaluate_audition(
    state: &AppState,
    id: Uuid,
) -> Result<AuditionEvaluationRow, AppError> {
    let audition = fetch_audition(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Audition {id} not found")))?;

    set_status(&state.db, id, AuditionStatus::Analyzing).await?;
    info!("Evaluating audition {id}");

    match run_evaluation(state, &audition).await {
        Ok(row) => {
            set_status(&state.db, id, AuditionStatus::Completed).await?;
            info!(
                "Audition {id} evaluated: score {} ({})",
                row.overall_match_score, row.recommendation
            );
            Ok(row)
        }
        Err(e) => {
            error!("Audition {id} evaluation failed: {e}");
            set_status(&state.db, id, AuditionStatus::Failed).await?;
            Err(e)
        }
    }
}

async fn run_evaluation(
    state: &AppState,
    audition: &AuditionRow,
) -> Result<AuditionEvaluationRow, AppError> {
    let video_url = state.storage.audition_video_url(&audition.video_url).await?;
    let prompt = build_audition_prompt(audition);

    let evaluation: AuditionEvaluation = state
        .llm
        .call_json_object(LlmCall::vision(&prompt, &video_url, AUDITION_MAX_TOKENS))
        .await
        .map_err(|e| AppError::Llm(format!("Audition analysis failed: {e}")))?;

    insert_evaluation(&state.db, audition.id, &evaluation.normalize()).await
}

async fn insert_evaluation(
    pool: &PgPool,
    audition_id: Uuid,
    evaluation: &NormalizedEvaluation,
) -> Result<AuditionEvaluationRow, AppError> {
    let row = sqlx::query_as(
        r#"
        INSERT INTO audition_evaluations
            (audition_id, overall_match_score, recommendation, emotions_detected,
             strengths, improvements, technical_notes, detailed_analysis)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(audition_id)
    .bind(evaluation.overall_match_score)
    .bind(evaluation.recommendation.as_str())
    .bind(json!(evaluation.emotions_detected))
    .bind(&evaluation.strengths)
    .bind(&evaluation.improvements)
    .bind(&evaluation.technical_notes)
    .bind(evaluation.detailed_analysis.as_ref().map(|d| json!(d)))
    .fetch_one(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_audition(description: &str, video: &str) -> NewAudition {
        NewAudition {
            talent_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_id: None,
            role_description: description.to_string(),
            emotional_keywords: vec![],
            video_path: video.to_string(),
        }
    }

    #[test]
    fn test_role_description_required() {
        assert!(new_audition("  ", "take1.mp4").validate().is_err());
        assert!(new_audition("Grieving keeper", "take1.mp4").validate().is_ok());
    }

    #[test]
    fn test_video_path_validated() {
        assert!(new_audition("Grieving keeper", "").validate().is_err());
        assert!(new_audition("Grieving keeper", "../take1.mp4").validate().is_err());
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auditions::service::{
    create_audition, evaluate_audition, get_audition, list_talent_auditions,
    AuditionWithEvaluation, NewAudition,
};
use crate::errors::AppError;
use crate::models::audition::{AuditionEvaluationRow, AuditionRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateAuditionRequest {
    pub talent_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub role_description: String,
    #[serde(default)]
    pub emotional_keywords: Vec<String>,
    pub video_path: String,
}

/// POST /api/v1/auditions
pub async fn handle_create_audition(
    State(state): State<AppState>,
    Json(req): Json<CreateAuditionRequest>,
) -> Result<(StatusCode, Json<AuditionRow>), AppError> {
    let audition = create_audition(
        &state.db,
        NewAudition {
            talent_id: req.talent_id,
            project_id: req.project_id,
            role_id: req.role_id,
            role_description: req.role_description,
            emotional_keywords: req.emotional_keywords,
            video_path: req.video_path,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(audition)))
}

/// GET /api/v1/auditions/:id
pub async fn handle_get_audition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditionWithEvaluation>, AppError> {
    Ok(Json(get_audition(&state.db, id).await?))
}

/// GET /api/v1/talent/:user_id/auditions
pub async fn handle_talent_auditions(
    State(state): State<AppState>,
    Path(talent_id): Path<Uuid>,
) -> Result<Json<Vec<AuditionWithEvaluation>>, AppError> {
    Ok(Json(list_talent_auditions(&state.db, talent_id).await?))
}

/// POST /api/v1/auditions/:id/evaluate
pub async fn handle_evaluate_audition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditionEvaluationRow>, AppError> {
    Ok(Json(evaluate_audition(&state, id).await?))
}

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::shortlist::pipeline::{run_ai_shortlist, ShortlistResponse};
use crate::shortlist::selection::{
    finalize_selection, manual_shortlist, ManualShortlistResponse, SelectionResponse,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AiShortlistRequest {
    pub director_id: Uuid,
}

#[derive(Deserialize)]
pub struct ManualShortlistRequest {
    pub director_id: Uuid,
    #[serde(default)]
    pub application_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct SelectionRequest {
    pub director_id: Uuid,
    pub application_id: Uuid,
}

/// POST /api/v1/projects/:id/shortlist/ai
pub async fn handle_ai_shortlist(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AiShortlistRequest>,
) -> Result<Json<ShortlistResponse>, AppError> {
    let response = run_ai_shortlist(&state, project_id, req.director_id).await?;
    Ok(Json(response))
}

/// POST /api/v1/projects/:id/shortlist/manual
pub async fn handle_manual_shortlist(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ManualShortlistRequest>,
) -> Result<Json<ManualShortlistResponse>, AppError> {
    let response =
        manual_shortlist(&state.db, project_id, req.director_id, &req.application_ids).await?;
    Ok(Json(response))
}

/// POST /api/v1/projects/:id/selection
pub async fn handle_final_selection(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, AppError> {
    let response =
        finalize_selection(&state.db, project_id, req.director_id, req.application_id).await?;
    Ok(Json(response))
}

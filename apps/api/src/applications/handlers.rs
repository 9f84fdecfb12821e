use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::service::{
    list_talent_applications, load_candidates, submit_application, NewApplication,
    TalentApplicationRow,
};
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::projects::repository::require_owned_project;
use crate::shortlist::Candidate;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub talent_id: Uuid,
    pub role_id: Option<Uuid>,
    pub video_path: String,
    pub audio_path: Option<String>,
    pub cover_letter: Option<String>,
}

/// POST /api/v1/projects/:id/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let application = submit_application(
        &state.db,
        NewApplication {
            project_id,
            talent_id: req.talent_id,
            role_id: req.role_id,
            video_path: req.video_path,
            audio_path: req.audio_path,
            cover_letter: req.cover_letter,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[derive(Deserialize)]
pub struct DirectorQuery {
    pub director_id: Uuid,
}

/// GET /api/v1/projects/:id/applications
pub async fn handle_project_applications(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(params): Query<DirectorQuery>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    require_owned_project(&state.db, project_id, params.director_id).await?;
    Ok(Json(load_candidates(&state, project_id).await?))
}

/// GET /api/v1/talent/:user_id/applications
pub async fn handle_talent_applications(
    State(state): State<AppState>,
    Path(talent_id): Path<Uuid>,
) -> Result<Json<Vec<TalentApplicationRow>>, AppError> {
    Ok(Json(list_talent_applications(&state.db, talent_id).await?))
}

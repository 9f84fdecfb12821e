use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::analysis::{ProfileAnalysis, RewordedDescription, TalentMatch};
use crate::matching::service::{
    analyze_profile, match_talent, recommend_candidates, reword_role_description,
    RecommendationsResponse,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AnalyzeProfileRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct MatchTalentRequest {
    pub talent_user_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Deserialize)]
pub struct RecommendCandidatesRequest {
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RewordRequest {
    pub project_id: Uuid,
}

/// POST /api/v1/ai/analyze-profile
pub async fn handle_analyze_profile(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeProfileRequest>,
) -> Result<Json<ProfileAnalysis>, AppError> {
    Ok(Json(analyze_profile(&state, req.user_id).await?))
}

/// POST /api/v1/ai/match-talent
pub async fn handle_match_talent(
    State(state): State<AppState>,
    Json(req): Json<MatchTalentRequest>,
) -> Result<Json<TalentMatch>, AppError> {
    Ok(Json(
        match_talent(&state, req.talent_user_id, req.role_id).await?,
    ))
}

/// POST /api/v1/ai/recommend-candidates
pub async fn handle_recommend_candidates(
    State(state): State<AppState>,
    Json(req): Json<RecommendCandidatesRequest>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    Ok(Json(
        recommend_candidates(&state, req.project_id, req.role_id, req.limit).await?,
    ))
}

/// POST /api/v1/ai/reword-role-description
pub async fn handle_reword_role_description(
    State(state): State<AppState>,
    Json(req): Json<RewordRequest>,
) -> Result<Json<RewordedDescription>, AppError> {
    Ok(Json(reword_role_description(&state, req.project_id).await?))
}

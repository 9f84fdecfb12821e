use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::NotificationRow;
use crate::notifications::service::{
    list_notifications, mark_all_read, mark_read, page_limit, unread_count,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NotificationListQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /api/v1/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    Query(params): Query<NotificationListQuery>,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    let rows = list_notifications(
        &state.db,
        params.user_id,
        params.unread_only,
        page_limit(params.limit),
    )
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/notifications/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = unread_count(&state.db, params.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// PATCH /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<StatusCode, AppError> {
    if !mark_read(&state.db, id, req.user_id).await? {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = mark_all_read(&state.db, req.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::forums::threads::{
    create_thread, get_thread, list_threads, reply_to_thread, CreatedPost, CreatedThread,
    ForumCategory, NewAttachment, NewThread, ThreadDetail, ThreadSummary,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ThreadListQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateThreadRequest {
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<NewAttachment>,
}

#[derive(Deserialize)]
pub struct ReplyRequest {
    pub user_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<NewAttachment>,
}

/// GET /api/v1/forums/threads
pub async fn handle_list_threads(
    State(state): State<AppState>,
    Query(params): Query<ThreadListQuery>,
) -> Result<Json<Vec<ThreadSummary>>, AppError> {
    let category = ForumCategory::filter(params.category.as_deref())?;
    Ok(Json(list_threads(&state.db, category).await?))
}

/// POST /api/v1/forums/threads
pub async fn handle_create_thread(
    State(state): State<AppState>,
    Json(req): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<CreatedThread>), AppError> {
    let thread = create_thread(
        &state.db,
        NewThread {
            user_id: req.user_id,
            title: req.title,
            category: req.category,
            content: req.content,
            tags: req.tags,
            attachments: req.attachments,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

/// GET /api/v1/forums/threads/:id
pub async fn handle_get_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreadDetail>, AppError> {
    Ok(Json(get_thread(&state, id).await?))
}

/// POST /api/v1/forums/threads/:id/posts
pub async fn handle_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<CreatedPost>), AppError> {
    let post = reply_to_thread(&state.db, id, req.user_id, &req.content, &req.attachments).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

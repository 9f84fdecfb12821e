use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::messaging::conversations::{
    create_or_get_conversation, delete_conversation, list_conversations, list_messages,
    send_message, set_archived, set_muted, ConversationSummary,
};
use crate::models::messaging::{ConversationParticipantRow, ConversationRow, MessageRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartConversationRequest {
    pub user_id: Uuid,
    pub other_user_id: Uuid,
}

#[derive(Deserialize)]
pub struct ConversationListQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Deserialize)]
pub struct ParticipantQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Deserialize)]
pub struct MuteRequest {
    pub user_id: Uuid,
    pub muted: bool,
}

#[derive(Deserialize)]
pub struct ArchiveRequest {
    pub user_id: Uuid,
    pub archived: bool,
}

/// POST /api/v1/conversations
///
/// 201 when a conversation was created, 200 when one already existed.
pub async fn handle_start_conversation(
    State(state): State<AppState>,
    Json(req): Json<StartConversationRequest>,
) -> Result<(StatusCode, Json<ConversationRow>), AppError> {
    let (conversation, created) =
        create_or_get_conversation(&state.db, req.user_id, req.other_user_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(conversation)))
}

/// GET /api/v1/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    Query(params): Query<ConversationListQuery>,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    Ok(Json(
        list_conversations(&state.db, params.user_id, params.include_archived).await?,
    ))
}

/// GET /api/v1/conversations/:id/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ParticipantQuery>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    Ok(Json(list_messages(&state.db, id, params.user_id).await?))
}

/// POST /api/v1/conversations/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>), AppError> {
    let message = send_message(&state.db, id, req.user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /api/v1/conversations/:id
pub async fn handle_delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ParticipantQuery>,
) -> Result<StatusCode, AppError> {
    delete_conversation(&state.db, id, params.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/conversations/:id/mute
pub async fn handle_mute_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MuteRequest>,
) -> Result<Json<ConversationParticipantRow>, AppError> {
    Ok(Json(set_muted(&state.db, id, req.user_id, req.muted).await?))
}

/// PATCH /api/v1/conversations/:id/archive
pub async fn handle_archive_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Json<ConversationRow>, AppError> {
    Ok(Json(
        set_archived(&state.db, id, req.user_id, req.archived).await?,
    ))
}

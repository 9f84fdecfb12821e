use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumThreadRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_moderated: bool,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumPostRow {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumAttachmentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub file_name: String,
    /// Object key in the forum-attachments bucket.
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

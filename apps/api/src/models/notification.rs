use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Shortlist,
    Selection,
    Message,
    Application,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Shortlist => "shortlist",
            NotificationKind::Selection => "selection",
            NotificationKind::Message => "message",
            NotificationKind::Application => "application",
            NotificationKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
    pub metadata: Option<Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Shortlisted,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub talent_id: Uuid,
    /// Object key in the application-videos bucket.
    pub video_url: String,
    pub audio_url: Option<String>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub ai_match_score: Option<i32>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted AI verdict for one application, kept for the final selection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortlistEvaluationRow {
    pub application_id: Uuid,
    pub project_id: Uuid,
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
    pub evaluated_at: DateTime<Utc>,
}

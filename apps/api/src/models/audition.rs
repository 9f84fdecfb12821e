use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditionStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl AuditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditionStatus::Pending => "pending",
            AuditionStatus::Analyzing => "analyzing",
            AuditionStatus::Completed => "completed",
            AuditionStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditionRow {
    pub id: Uuid,
    pub talent_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub role_description: String,
    pub emotional_keywords: Option<Vec<String>>,
    /// Object key in the audition-videos bucket.
    pub video_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditionEvaluationRow {
    pub id: Uuid,
    pub audition_id: Uuid,
    pub overall_match_score: i32,
    pub recommendation: String,
    pub emotions_detected: Value,
    pub strengths: Option<Vec<String>>,
    pub improvements: Option<Vec<String>>,
    pub technical_notes: Option<Vec<String>>,
    pub detailed_analysis: Option<Value>,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Draft,
    Open,
    Completed,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Open => "open",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub director_id: Uuid,
    pub title: String,
    pub project_type: String,
    pub description: Option<String>,
    pub production_company: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub shoot_start_date: Option<NaiveDate>,
    pub shoot_end_date: Option<NaiveDate>,
    pub remote_auditions_only: bool,
    pub mood_board_urls: Option<Value>,
    pub is_draft: bool,
    pub status: String,
    pub selected_talent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    pub fn is_status(&self, status: ProjectStatus) -> bool {
        self.status == status.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectRoleRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub role_name: String,
    pub role_description: Option<String>,
    pub emotions: Option<Vec<String>>,
    /// Free-form requirements; read through `projects::requirements::RoleRequirements`.
    pub requirements: Option<Value>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Talent,
    Director,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Talent => "talent",
            UserType::Director => "director",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `public_profiles` view: a profile without contact details.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicProfileRow {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct TalentProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<i32>,
    pub height_feet: Option<i32>,
    pub height_inches: Option<i32>,
    /// Weight in pounds, as entered on imperial forms.
    pub weight: Option<i32>,
    pub hair_color: Option<String>,
    pub eye_color: Option<String>,
    pub gender_identity: Option<String>,
    pub ethnicity: Option<Vec<String>>,
    pub looks_types: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub instruments: Option<Vec<String>>,
    pub combat_skills: Option<Vec<String>>,
    pub athletic_skills: Option<Vec<String>>,
    pub special_skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub union_status: Option<String>,
    pub agent_name: Option<String>,
    pub agent_contact: Option<String>,
    pub manager_name: Option<String>,
    pub manager_contact: Option<String>,
    pub resume_url: Option<String>,
    pub profile_completion_percentage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TalentCreditRow {
    pub id: Uuid,
    pub talent_profile_id: Uuid,
    pub project_title: String,
    pub role_name: String,
    pub project_type: Option<String>,
    pub production_company: Option<String>,
    pub director_name: Option<String>,
    pub year: Option<i32>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TalentMediaRow {
    pub id: Uuid,
    pub talent_profile_id: Uuid,
    pub title: String,
    pub media_type: String,
    pub media_category: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<i32>,
    pub file_size: Option<i64>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DirectorProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub industry_role: Option<String>,
    pub professional_bio: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub ai_matching_sensitivity: String,
    pub ai_prioritization: Option<Value>,
    pub ai_bias_filters: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DirectorTeamMemberRow {
    pub id: Uuid,
    pub director_profile_id: Uuid,
    pub member_name: String,
    pub member_email: String,
    pub role: String,
    pub status: String,
    pub permissions: Option<Value>,
    pub invited_at: DateTime<Utc>,
    pub joined_at: Option<DateTime<Utc>>,
}

/// A project the talent was selected for, shown on their portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TalentPortfolioProjectRow {
    pub id: Uuid,
    pub talent_id: Uuid,
    pub project_id: Uuid,
    pub project_title: String,
    pub project_type: String,
    pub production_company: Option<String>,
    pub director_name: Option<String>,
    pub role_description: Option<String>,
    pub match_score: Option<i32>,
    pub ai_evaluation: Option<Value>,
    pub selected_at: DateTime<Utc>,
}

/// A director's finished casting, with the shortlist it was chosen from.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompletedProjectRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub director_id: Uuid,
    pub selected_talent_id: Uuid,
    pub project_title: String,
    pub project_type: String,
    pub production_company: Option<String>,
    pub shortlist_data: Value,
    pub completed_at: DateTime<Utc>,
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::profile::{
    CompletedProjectRow, DirectorProfileRow, DirectorTeamMemberRow, ProfileRow, PublicProfileRow,
    TalentCreditRow, TalentMediaRow, TalentPortfolioProjectRow, TalentProfileRow, UserType,
};
use crate::profiles::completeness::{compute_completion_report, CompletionReport};
use crate::profiles::repository::{
    count_media, fetch_completed_projects, fetch_credits, fetch_director_profile, fetch_media,
    fetch_portfolio, fetch_public_profile, fetch_talent_profile, fetch_team,
    search_public_profiles,
};
use crate::profiles::validation::{
    clean_list, validate_email, validate_not_blank, validate_range, validate_sensitivity,
    HEIGHT_CM_RANGE, WEIGHT_KG_RANGE,
};
use crate::state::AppState;

const DEFAULT_DISCOVERY_LIMIT: i64 = 50;
const MAX_DISCOVERY_LIMIT: i64 = 100;

// ── Public profiles ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ProfileSearchQuery {
    pub user_type: Option<UserType>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(params): Query<ProfileSearchQuery>,
) -> Result<Json<Vec<PublicProfileRow>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_DISCOVERY_LIMIT)
        .clamp(1, MAX_DISCOVERY_LIMIT);
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let rows = search_public_profiles(
        &state.db,
        params.user_type.map(|t| t.as_str()),
        search,
        limit,
    )
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/profiles/:user_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PublicProfileRow>, AppError> {
    let profile = fetch_public_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// PUT /api/v1/profiles/:user_id
///
/// Returns the full row, contact details included, to the profile's owner.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<ProfileRow>, AppError> {
    validate_not_blank("full_name", req.full_name.as_deref())?;

    let profile: ProfileRow = sqlx::query_as(
        r#"
        UPDATE profiles SET
            full_name  = COALESCE($2, full_name),
            bio        = COALESCE($3, bio),
            avatar_url = COALESCE($4, avatar_url),
            updated_at = now()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(req.full_name.as_deref().map(str::trim))
    .bind(&req.bio)
    .bind(&req.avatar_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;

    Ok(Json(profile))
}

// ── Talent ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TalentProfileResponse {
    pub profile: TalentProfileRow,
    pub credits: Vec<TalentCreditRow>,
    pub media: Vec<TalentMediaRow>,
    pub completion: CompletionReport,
}

/// GET /api/v1/talent/:user_id
pub async fn handle_get_talent(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<TalentProfileResponse>, AppError> {
    let profile = fetch_talent_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Talent profile for {user_id} not found")))?;
    let credits = fetch_credits(&state.db, profile.id).await?;
    let media = fetch_media(&state.db, profile.id).await?;
    let completion = compute_completion_report(&profile, media.len());

    Ok(Json(TalentProfileResponse {
        profile,
        credits,
        media,
        completion,
    }))
}

/// Fields a talent can set on their profile. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct TalentProfileUpdate {
    pub height_cm: Option<i32>,
    pub weight_kg: Option<i32>,
    pub height_feet: Option<i32>,
    pub height_inches: Option<i32>,
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
}

impl TalentProfileUpdate {
    fn validate(&self) -> Result<(), AppError> {
        validate_range("height_cm", self.height_cm, HEIGHT_CM_RANGE)?;
        validate_range("weight_kg", self.weight_kg, WEIGHT_KG_RANGE)?;
        validate_range("height_feet", self.height_feet, (1, 8))?;
        validate_range("height_inches", self.height_inches, (0, 11))?;
        Ok(())
    }
}

/// PUT /api/v1/talent/:user_id
pub async fn handle_upsert_talent(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<TalentProfileUpdate>,
) -> Result<Json<TalentProfileResponse>, AppError> {
    req.validate()?;

    let mut tx = state.db.begin().await?;

    let profile: TalentProfileRow = sqlx::query_as(
        r#"
        INSERT INTO talent_profiles (
            user_id, height_cm, weight_kg, height_feet, height_inches, weight,
            hair_color, eye_color, gender_identity, ethnicity, looks_types, languages,
            instruments, combat_skills, athletic_skills, special_skills, location,
            union_status, agent_name, agent_contact, manager_name, manager_contact, resume_url
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23)
        ON CONFLICT (user_id) DO UPDATE SET
            height_cm       = COALESCE(EXCLUDED.height_cm, talent_profiles.height_cm),
            weight_kg       = COALESCE(EXCLUDED.weight_kg, talent_profiles.weight_kg),
            height_feet     = COALESCE(EXCLUDED.height_feet, talent_profiles.height_feet),
            height_inches   = COALESCE(EXCLUDED.height_inches, talent_profiles.height_inches),
            weight          = COALESCE(EXCLUDED.weight, talent_profiles.weight),
            hair_color      = COALESCE(EXCLUDED.hair_color, talent_profiles.hair_color),
            eye_color       = COALESCE(EXCLUDED.eye_color, talent_profiles.eye_color),
            gender_identity = COALESCE(EXCLUDED.gender_identity, talent_profiles.gender_identity),
            ethnicity       = COALESCE(EXCLUDED.ethnicity, talent_profiles.ethnicity),
            looks_types     = COALESCE(EXCLUDED.looks_types, talent_profiles.looks_types),
            languages       = COALESCE(EXCLUDED.languages, talent_profiles.languages),
            instruments     = COALESCE(EXCLUDED.instruments, talent_profiles.instruments),
            combat_skills   = COALESCE(EXCLUDED.combat_skills, talent_profiles.combat_skills),
            athletic_skills = COALESCE(EXCLUDED.athletic_skills, talent_profiles.athletic_skills),
            special_skills  = COALESCE(EXCLUDED.special_skills, talent_profiles.special_skills),
            location        = COALESCE(EXCLUDED.location, talent_profiles.location),
            union_status    = COALESCE(EXCLUDED.union_status, talent_profiles.union_status),
            agent_name      = COALESCE(EXCLUDED.agent_name, talent_profiles.agent_name),
            agent_contact   = COALESCE(EXCLUDED.agent_contact, talent_profiles.agent_contact),
            manager_name    = COALESCE(EXCLUDED.manager_name, talent_profiles.manager_name),
            manager_contact = COALESCE(EXCLUDED.manager_contact, talent_profiles.manager_contact),
            resume_url      = COALESCE(EXCLUDED.resume_url, talent_profiles.resume_url),
            updated_at      = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(req.height_cm)
    .bind(req.weight_kg)
    .bind(req.height_feet)
    .bind(req.height_inches)
    .bind(req.weight)
    .bind(&req.hair_color)
    .bind(&req.eye_color)
    .bind(&req.gender_identity)
    .bind(clean_list(req.ethnicity.clone()))
    .bind(clean_list(req.looks_types.clone()))
    .bind(clean_list(req.languages.clone()))
    .bind(clean_list(req.instruments.clone()))
    .bind(clean_list(req.combat_skills.clone()))
    .bind(clean_list(req.athletic_skills.clone()))
    .bind(clean_list(req.special_skills.clone()))
    .bind(&req.location)
    .bind(&req.union_status)
    .bind(&req.agent_name)
    .bind(&req.agent_contact)
    .bind(&req.manager_name)
    .bind(&req.manager_contact)
    .bind(&req.resume_url)
    .fetch_one(&mut *tx)
    .await?;

    let media_count = count_media(&mut *tx, profile.id).await?;
    let completion = compute_completion_report(&profile, media_count.max(0) as usize);

    let profile: TalentProfileRow = sqlx::query_as(
        "UPDATE talent_profiles SET profile_completion_percentage = $2 WHERE id = $1 RETURNING *",
    )
    .bind(profile.id)
    .bind(completion.percentage)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(
        "Talent profile {} saved ({}% complete)",
        user_id, completion.percentage
    );

    let credits = fetch_credits(&state.db, profile.id).await?;
    let media = fetch_media(&state.db, profile.id).await?;
    Ok(Json(TalentProfileResponse {
        profile,
        credits,
        media,
        completion,
    }))
}

/// GET /api/v1/talent/:user_id/portfolio
pub async fn handle_get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<TalentPortfolioProjectRow>>, AppError> {
    Ok(Json(fetch_portfolio(&state.db, user_id).await?))
}

// ── Directors ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DirectorProfileResponse {
    pub profile: DirectorProfileRow,
    pub team: Vec<DirectorTeamMemberRow>,
}

/// GET /api/v1/directors/:user_id
pub async fn handle_get_director(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DirectorProfileResponse>, AppError> {
    let profile = fetch_director_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Director profile for {user_id} not found")))?;
    let team = fetch_team(&state.db, profile.id).await?;
    Ok(Json(DirectorProfileResponse { profile, team }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectorProfileUpdate {
    pub company_name: Option<String>,
    pub industry_role: Option<String>,
    pub professional_bio: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub ai_matching_sensitivity: Option<String>,
    pub ai_prioritization: Option<Value>,
    pub ai_bias_filters: Option<Value>,
}

/// PUT /api/v1/directors/:user_id
pub async fn handle_upsert_director(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<DirectorProfileUpdate>,
) -> Result<Json<DirectorProfileResponse>, AppError> {
    let sensitivity = req
        .ai_matching_sensitivity
        .as_deref()
        .map(|s| s.trim().to_lowercase());
    if let Some(s) = sensitivity.as_deref() {
        validate_sensitivity(s)?;
    }

    let profile: DirectorProfileRow = sqlx::query_as(
        r#"
        INSERT INTO director_profiles (
            user_id, company_name, industry_role, professional_bio, website, logo_url,
            ai_matching_sensitivity, ai_prioritization, ai_bias_filters
        )
        VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'medium'), $8, $9)
        ON CONFLICT (user_id) DO UPDATE SET
            company_name            = COALESCE(EXCLUDED.company_name, director_profiles.company_name),
            industry_role           = COALESCE(EXCLUDED.industry_role, director_profiles.industry_role),
            professional_bio        = COALESCE(EXCLUDED.professional_bio, director_profiles.professional_bio),
            website                 = COALESCE(EXCLUDED.website, director_profiles.website),
            logo_url                = COALESCE(EXCLUDED.logo_url, director_profiles.logo_url),
            ai_matching_sensitivity = COALESCE($7, director_profiles.ai_matching_sensitivity),
            ai_prioritization       = COALESCE(EXCLUDED.ai_prioritization, director_profiles.ai_prioritization),
            ai_bias_filters         = COALESCE(EXCLUDED.ai_bias_filters, director_profiles.ai_bias_filters),
            updated_at              = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&req.company_name)
    .bind(&req.industry_role)
    .bind(&req.professional_bio)
    .bind(&req.website)
    .bind(&req.logo_url)
    .bind(sensitivity)
    .bind(&req.ai_prioritization)
    .bind(&req.ai_bias_filters)
    .fetch_one(&state.db)
    .await?;

    let team = fetch_team(&state.db, profile.id).await?;
    Ok(Json(DirectorProfileResponse { profile, team }))
}

#[derive(Deserialize)]
pub struct TeamInvite {
    pub member_name: String,
    pub member_email: String,
    pub role: String,
    pub permissions: Option<Value>,
}

/// POST /api/v1/directors/:user_id/team
pub async fn handle_invite_team_member(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<TeamInvite>,
) -> Result<(StatusCode, Json<DirectorTeamMemberRow>), AppError> {
    validate_not_blank("member_name", Some(&req.member_name))?;
    validate_not_blank("role", Some(&req.role))?;
    validate_email(&req.member_email)?;

    let director = fetch_director_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Director profile for {user_id} not found")))?;

    let member: DirectorTeamMemberRow = sqlx::query_as(
        r#"
        INSERT INTO director_team_members
            (director_profile_id, member_name, member_email, role, permissions)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(director.id)
    .bind(req.member_name.trim())
    .bind(req.member_email.trim().to_lowercase())
    .bind(req.role.trim())
    .bind(&req.permissions)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("{} is already on the team", req.member_email.trim()))
        } else {
            AppError::Database(e)
        }
    })?;

    info!("Director {} invited {}", user_id, member.member_email);
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /api/v1/directors/:user_id/completed-projects
pub async fn handle_completed_projects(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<CompletedProjectRow>>, AppError> {
    Ok(Json(fetch_completed_projects(&state.db, user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_talent_update_ranges() {
        let ok = TalentProfileUpdate {
            height_cm: Some(180),
            weight_kg: Some(75),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_tall = TalentProfileUpdate {
            height_cm: Some(300),
            ..Default::default()
        };
        assert!(matches!(too_tall.validate(), Err(AppError::Validation(_))));

        let bad_inches = TalentProfileUpdate {
            height_inches: Some(12),
            ..Default::default()
        };
        assert!(bad_inches.validate().is_err());
    }

    #[test]
    fn test_talent_update_accepts_partial_json() {
        let update: TalentProfileUpdate =
            serde_json::from_str(r#"{ "languages": ["English"], "location": "Lisbon" }"#).unwrap();
        assert_eq!(update.languages, Some(vec!["English".to_string()]));
        assert!(update.height_cm.is_none());
        assert!(update.validate().is_ok());
    }
}

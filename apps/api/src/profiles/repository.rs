use std::collections::HashMap;

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::profile::{
    CompletedProjectRow, DirectorProfileRow, DirectorTeamMemberRow, PublicProfileRow,
    TalentCreditRow, TalentMediaRow, TalentPortfolioProjectRow, TalentProfileRow,
};

const PUBLIC_PROFILE_COLUMNS: &str =
    "user_id, full_name, avatar_url, bio, user_type, created_at";

pub async fn fetch_public_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<PublicProfileRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PUBLIC_PROFILE_COLUMNS} FROM public_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Public profiles for a set of users, keyed by user id. Unknown ids are absent.
pub async fn fetch_public_profiles(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, PublicProfileRow>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<PublicProfileRow> = sqlx::query_as(&format!(
        "SELECT {PUBLIC_PROFILE_COLUMNS} FROM public_profiles WHERE user_id = ANY($1)"
    ))
    .bind(user_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|p| (p.user_id, p)).collect())
}

pub async fn search_public_profiles(
    pool: &PgPool,
    user_type: Option<&str>,
    search: Option<&str>,
    limit: i64,
) -> Result<Vec<PublicProfileRow>, sqlx::Error> {
    let pattern = search.map(|s| format!("%{}%", escape_like(s)));
    sqlx::query_as(&format!(
        r#"
        SELECT {PUBLIC_PROFILE_COLUMNS} FROM public_profiles
        WHERE ($1::text IS NULL OR user_type = $1)
          AND ($2::text IS NULL OR full_name ILIKE $2)
        ORDER BY created_at DESC
        LIMIT $3
        "#
    ))
    .bind(user_type)
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn fetch_talent_profile<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<TalentProfileRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as("SELECT * FROM talent_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Talent profiles for a set of users, keyed by user id.
pub async fn fetch_talent_profiles(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, TalentProfileRow>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<TalentProfileRow> =
        sqlx::query_as("SELECT * FROM talent_profiles WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|t| (t.user_id, t)).collect())
}

/// A page of talent profiles with their credit counts, most complete first.
pub async fn fetch_talent_pool(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<(TalentProfileRow, i64)>, sqlx::Error> {
    let talents: Vec<TalentProfileRow> = sqlx::query_as(
        "SELECT * FROM talent_profiles ORDER BY profile_completion_percentage DESC, updated_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let ids: Vec<Uuid> = talents.iter().map(|t| t.id).collect();
    let counts: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT talent_profile_id, COUNT(*) FROM talent_credits WHERE talent_profile_id = ANY($1) GROUP BY talent_profile_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;
    let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

    Ok(talents
        .into_iter()
        .map(|t| {
            let credits = counts.get(&t.id).copied().unwrap_or(0);
            (t, credits)
        })
        .collect())
}

pub async fn fetch_credits(
    pool: &PgPool,
    talent_profile_id: Uuid,
) -> Result<Vec<TalentCreditRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM talent_credits WHERE talent_profile_id = $1 ORDER BY year DESC NULLS LAST, created_at DESC",
    )
    .bind(talent_profile_id)
    .fetch_all(pool)
    .await
}

pub async fn count_credits(pool: &PgPool, talent_profile_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM talent_credits WHERE talent_profile_id = $1")
        .bind(talent_profile_id)
        .fetch_one(pool)
        .await
}

pub async fn fetch_media(
    pool: &PgPool,
    talent_profile_id: Uuid,
) -> Result<Vec<TalentMediaRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM talent_media WHERE talent_profile_id = $1 ORDER BY is_featured DESC, created_at DESC",
    )
    .bind(talent_profile_id)
    .fetch_all(pool)
    .await
}

pub async fn count_media<'e, E>(executor: E, talent_profile_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM talent_media WHERE talent_profile_id = $1")
        .bind(talent_profile_id)
        .fetch_one(executor)
        .await
}

pub async fn fetch_portfolio(
    pool: &PgPool,
    talent_id: Uuid,
) -> Result<Vec<TalentPortfolioProjectRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM talent_portfolio_projects WHERE talent_id = $1 ORDER BY selected_at DESC",
    )
    .bind(talent_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_director_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<DirectorProfileRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM director_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_team(
    pool: &PgPool,
    director_profile_id: Uuid,
) -> Result<Vec<DirectorTeamMemberRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM director_team_members WHERE director_profile_id = $1 ORDER BY invited_at",
    )
    .bind(director_profile_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_completed_projects(
    pool: &PgPool,
    director_id: Uuid,
) -> Result<Vec<CompletedProjectRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM completed_projects WHERE director_id = $1 ORDER BY completed_at DESC",
    )
    .bind(director_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Ana"), "Ana");
    }
}

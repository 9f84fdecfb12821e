use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::project::ProjectStatus;
use crate::notifications::service::{application_notice, notify};
use crate::profiles::repository::{fetch_public_profile, fetch_public_profiles, fetch_talent_profiles};
use crate::projects::repository::{fetch_role, require_project};
use crate::shortlist::Candidate;
use crate::state::AppState;
use crate::storage::validate_object_key;

pub struct NewApplication {
    pub project_id: Uuid,
    pub talent_id: Uuid,
    pub role_id: Option<Uuid>,
    pub video_path: String,
    pub audio_path: Option<String>,
    pub cover_letter: Option<String>,
}

impl NewApplication {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_object_key("video_path", &self.video_path)?;
        if let Some(audio) = &self.audio_path {
            validate_object_key("audio_path", audio)?;
        }
        Ok(())
    }
}

/// Submits an application. The project must be open and the role, if any,
/// must belong to it. A talent applies to a project at most once.
pub async fn submit_application(
    pool: &PgPool,
    new: NewApplication,
) -> Result<ApplicationRow, AppError> {
    new.validate()?;

    let project = require_project(pool, new.project_id).await?;
    if !project.is_status(ProjectStatus::Open) || project.is_draft {
        return Err(AppError::Validation(format!(
            "Project {} is not accepting applications",
            project.id
        )));
    }

    if let Some(role_id) = new.role_id {
        let belongs = fetch_role(pool, role_id)
            .await?
            .is_some_and(|r| r.project_id == project.id);
        if !belongs {
            return Err(AppError::Validation(format!(
                "Role {role_id} does not belong to project {}",
                project.id
            )));
        }
    }

    let cover_letter = new
        .cover_letter
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let talent_name = fetch_public_profile(pool, new.talent_id)
        .await?
        .and_then(|p| p.full_name)
        .unwrap_or_else(|| "A talent".to_string());

    let mut tx = pool.begin().await?;

    let application: ApplicationRow = sqlx::query_as(
        r#"
        INSERT INTO applications (project_id, role_id, talent_id, video_url, audio_url, cover_letter, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(project.id)
    .bind(new.role_id)
    .bind(new.talent_id)
    .bind(new.video_path.trim())
    .bind(new.audio_path.as_deref().map(str::trim))
    .bind(cover_letter)
    .bind(ApplicationStatus::Pending.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You have already applied to this project".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    notify(
        &mut *tx,
        &application_notice(project.director_id, project.id, &project.title, &talent_name),
    )
    .await?;

    tx.commit().await?;
    info!(
        "Application {} submitted to project {} by {}",
        application.id, project.id, new.talent_id
    );
    Ok(application)
}

/// Non-rejected applications of a project with profiles and playable video
/// links, best AI score first, then oldest first.
pub async fn load_candidates(state: &AppState, project_id: Uuid) -> Result<Vec<Candidate>, AppError> {
    let applications: Vec<ApplicationRow> = sqlx::query_as(
        r#"
        SELECT * FROM applications
        WHERE project_id = $1 AND status <> $2
        ORDER BY ai_match_score DESC NULLS LAST, applied_at ASC
        "#,
    )
    .bind(project_id)
    .bind(ApplicationStatus::Rejected.as_str())
    .fetch_all(&state.db)
    .await?;

    if applications.is_empty() {
        return Ok(Vec::new());
    }

    let talent_ids: Vec<Uuid> = applications.iter().map(|a| a.talent_id).collect();
    let mut profiles = fetch_public_profiles(&state.db, &talent_ids).await?;
    let mut talents = fetch_talent_profiles(&state.db, &talent_ids).await?;

    let mut candidates = Vec::with_capacity(applications.len());
    for application in applications {
        let video_url = match state.storage.application_video_url(&application.video_url).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("No playable video for application {}: {e}", application.id);
                None
            }
        };
        candidates.push(Candidate {
            profile: profiles.remove(&application.talent_id),
            talent: talents.remove(&application.talent_id),
            application,
            video_url,
        });
    }
    Ok(candidates)
}

/// An application as the talent sees it in their list.
#[derive(Debug, Clone, serde::Serialize, FromRow)]
pub struct TalentApplicationRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub project_title: String,
    pub project_type: String,
    pub role_name: Option<String>,
}

pub async fn list_talent_applications(
    pool: &PgPool,
    talent_id: Uuid,
) -> Result<Vec<TalentApplicationRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT a.*, p.title AS project_title, p.project_type, r.role_name
        FROM applications a
        JOIN projects p ON p.id = a.project_id
        LEFT JOIN project_roles r ON r.id = a.role_id
        WHERE a.talent_id = $1
        ORDER BY a.applied_at DESC
        "#,
    )
    .bind(talent_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_application(video: &str, audio: Option<&str>) -> NewApplication {
        NewApplication {
            project_id: Uuid::new_v4(),
            talent_id: Uuid::new_v4(),
            role_id: None,
            video_path: video.to_string(),
            audio_path: audio.map(str::to_string),
            cover_letter: None,
        }
    }

    #[test]
    fn test_video_path_required() {
        assert!(new_application("", None).validate().is_err());
        assert!(new_application("   ", None).validate().is_err());
        assert!(new_application("talent/abc/reel.mp4", None).validate().is_ok());
    }

    #[test]
    fn test_paths_must_be_relative_keys() {
        assert!(new_application("../other/reel.mp4", None).validate().is_err());
        assert!(new_application("reel.mp4", Some("/etc/passwd")).validate().is_err());
        assert!(new_application("reel.mp4", Some("talent/abc/voice.m4a"))
            .validate()
            .is_ok());
    }
}

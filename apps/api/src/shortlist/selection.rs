//! Director decisions after the AI pass: a manual shortlist and the final
//! selection that completes a project.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus, ShortlistEvaluationRow};
use crate::models::profile::CompletedProjectRow;
use crate::models::project::{ProjectRow, ProjectStatus};
use crate::notifications::service::{notify, selected_notice, shortlisted_notice};
use crate::profiles::repository::fetch_public_profiles;
use crate::projects::repository::{ensure_owner, fetch_role, require_owned_project};
use crate::shortlist::scorer::SHORTLIST_THRESHOLD;

#[derive(Debug, Serialize)]
pub struct ManualShortlistResponse {
    pub shortlisted: Vec<ApplicationRow>,
    pub rejected_count: u64,
}

pub async fn manual_shortlist(
    pool: &PgPool,
    project_id: Uuid,
    director_id: Uuid,
    application_ids: &[Uuid],
) -> Result<ManualShortlistResponse, AppError> {
    let chosen: Vec<Uuid> = dedup_ids(application_ids);
    if chosen.is_empty() {
        return Err(AppError::Validation(
            "Select at least one application to shortlist".to_string(),
        ));
    }

    let project = require_owned_project(pool, project_id, director_id).await?;
    ensure_not_completed(&project)?;

    let project_application_ids: HashSet<Uuid> =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM applications WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();
    if let Some(stray) = chosen.iter().find(|id| !project_application_ids.contains(id)) {
        return Err(AppError::Validation(format!(
            "Application {stray} does not belong to project {project_id}"
        )));
    }

    let mut tx = pool.begin().await?;

    let shortlisted: Vec<ApplicationRow> = sqlx::query_as(
        "UPDATE applications SET status = $2, updated_at = now() WHERE id = ANY($1) RETURNING *",
    )
    .bind(&chosen)
    .bind(ApplicationStatus::Shortlisted.as_str())
    .fetch_all(&mut *tx)
    .await?;

    let rejected = sqlx::query(
        r#"
        UPDATE applications SET status = $3, updated_at = now()
        WHERE project_id = $1 AND id <> ALL($2) AND status <> $3
        "#,
    )
    .bind(project_id)
    .bind(&chosen)
    .bind(ApplicationStatus::Rejected.as_str())
    .execute(&mut *tx)
    .await?;

    for application in &shortlisted {
        notify(
            &mut *tx,
            &shortlisted_notice(application.talent_id, project_id, &project.title),
        )
        .await?;
    }

    tx.commit().await?;
    info!(
        "Project {project_id}: {} shortlisted manually, {} rejected",
        shortlisted.len(),
        rejected.rows_affected()
    );

    Ok(ManualShortlistResponse {
        shortlisted,
        rejected_count: rejected.rows_affected(),
    })
}

/// One applicant in the shortlist snapshot kept with a completed project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistSnapshotEntry {
    pub application_id: Uuid,
    pub talent_id: Uuid,
    pub talent_name: String,
    pub match_score: Option<i32>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub project: ProjectRow,
    pub selected_application: ApplicationRow,
    pub completed_project: CompletedProjectRow,
    pub rejected_count: u64,
}

pub async fn finalize_selection(
    pool: &PgPool,
    project_id: Uuid,
    director_id: Uuid,
    application_id: Uuid,
) -> Result<SelectionResponse, AppError> {
    let project = require_owned_project(pool, project_id, director_id).await?;
    ensure_not_completed(&project)?;

    // Snapshot inputs, read before any status changes.
    let applications: Vec<ApplicationRow> =
        sqlx::query_as("SELECT * FROM applications WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;
    let evaluations: Vec<ShortlistEvaluationRow> =
        sqlx::query_as("SELECT * FROM shortlist_evaluations WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;

    let winner = applications
        .iter()
        .find(|a| a.id == application_id)
        .cloned()
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Application {application_id} not found in project {project_id}"
            ))
        })?;
    if winner.status == ApplicationStatus::Rejected.as_str() {
        return Err(AppError::Validation(format!(
            "Application {application_id} was rejected and cannot be selected"
        )));
    }

    let mut user_ids: Vec<Uuid> = applications.iter().map(|a| a.talent_id).collect();
    user_ids.push(director_id);
    let profiles = fetch_public_profiles(pool, &user_ids).await?;
    let names: HashMap<Uuid, String> = profiles
        .iter()
        .filter_map(|(id, p)| p.full_name.clone().map(|n| (*id, n)))
        .collect();
    let director_name = names.get(&director_id).cloned();

    let role_description = match winner.role_id {
        Some(role_id) => fetch_role(pool, role_id)
            .await?
            .and_then(|r| r.role_description.or(Some(r.role_name))),
        None => None,
    };

    let snapshot = build_shortlist_data(&applications, &evaluations, &names, application_id);
    let winner_evaluation = evaluations.iter().find(|e| e.application_id == application_id);

    let mut tx = pool.begin().await?;

    let project: ProjectRow = sqlx::query_as("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))?;
    ensure_owner(&project, director_id)?;
    ensure_not_completed(&project)?;

    let selected_application: ApplicationRow = sqlx::query_as(
        "UPDATE applications SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(application_id)
    .bind(ApplicationStatus::Accepted.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let rejected = sqlx::query(
        r#"
        UPDATE applications SET status = $3, updated_at = now()
        WHERE project_id = $1 AND id <> $2 AND status IN ($4, $5)
        "#,
    )
    .bind(project_id)
    .bind(application_id)
    .bind(ApplicationStatus::Rejected.as_str())
    .bind(ApplicationStatus::Shortlisted.as_str())
    .bind(ApplicationStatus::Pending.as_str())
    .execute(&mut *tx)
    .await?;

    let project: ProjectRow = sqlx::query_as(
        r#"
        UPDATE projects SET status = $2, selected_talent_id = $3, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(ProjectStatus::Completed.as_str())
    .bind(winner.talent_id)
    .fetch_one(&mut *tx)
    .await?;

    let completed_project: CompletedProjectRow = sqlx::query_as(
        r#"
        INSERT INTO completed_projects
            (project_id, director_id, selected_talent_id, project_title, project_type,
             production_company, shortlist_data)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(project_id)
    .bind(director_id)
    .bind(winner.talent_id)
    .bind(&project.title)
    .bind(&project.project_type)
    .bind(&project.production_company)
    .bind(json!(snapshot))
    .fetch_one(&mut *tx)
    .await?;

    let ai_evaluation = winner_evaluation.map(|e| {
        json!({
            "match_score": e.match_score,
            "strengths": e.strengths,
            "concerns": e.concerns,
            "recommendation": e.recommendation,
        })
    });
    sqlx::query(
        r#"
        INSERT INTO talent_portfolio_projects
            (talent_id, project_id, project_title, project_type, production_company,
             director_name, role_description, match_score, ai_evaluation)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (talent_id, project_id) DO NOTHING
        "#,
    )
    .bind(winner.talent_id)
    .bind(project_id)
    .bind(&project.title)
    .bind(&project.project_type)
    .bind(&project.production_company)
    .bind(&director_name)
    .bind(&role_description)
    .bind(winner_evaluation.map(|e| e.match_score).or(winner.ai_match_score))
    .bind(ai_evaluation)
    .execute(&mut *tx)
    .await?;

    notify(
        &mut *tx,
        &selected_notice(winner.talent_id, project_id, &project.title, application_id),
    )
    .await?;

    tx.commit().await?;
    info!(
        "Project {project_id} completed: selected talent {} (application {application_id}), {} rejected",
        winner.talent_id,
        rejected.rows_affected()
    );

    Ok(SelectionResponse {
        project,
        selected_application,
        completed_project,
        rejected_count: rejected.rows_affected(),
    })
}

/// The shortlist as it stood at selection time: everyone the AI passed,
/// everyone the director shortlisted, and the winner. Best score first.
pub fn build_shortlist_data(
    applications: &[ApplicationRow],
    evaluations: &[ShortlistEvaluationRow],
    names: &HashMap<Uuid, String>,
    winner_id: Uuid,
) -> Vec<ShortlistSnapshotEntry> {
    let by_application: HashMap<Uuid, &ShortlistEvaluationRow> =
        evaluations.iter().map(|e| (e.application_id, e)).collect();

    let mut entries: Vec<ShortlistSnapshotEntry> = applications
        .iter()
        .filter_map(|app| {
            let evaluation = by_application.get(&app.id).copied();
            let selected = app.id == winner_id;
            let included = selected
                || app.status == ApplicationStatus::Shortlisted.as_str()
                || evaluation.is_some_and(|e| e.match_score >= SHORTLIST_THRESHOLD);
            if !included {
                return None;
            }
            Some(ShortlistSnapshotEntry {
                application_id: app.id,
                talent_id: app.talent_id,
                talent_name: names
                    .get(&app.talent_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                match_score: evaluation.map(|e| e.match_score).or(app.ai_match_score),
                strengths: evaluation.map(|e| e.strengths.clone()).unwrap_or_default(),
                concerns: evaluation.map(|e| e.concerns.clone()).unwrap_or_default(),
                recommendation: evaluation.map(|e| e.recommendation.clone()),
                selected,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    entries
}

fn ensure_not_completed(project: &ProjectRow) -> Result<(), AppError> {
    if project.is_status(ProjectStatus::Completed) {
        return Err(AppError::Conflict(format!(
            "Project {} is already completed",
            project.id
        )));
    }
    Ok(())
}

fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn application(status: &str, score: Option<i32>) -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_id: None,
            talent_id: Uuid::new_v4(),
            video_url: "reel.mp4".to_string(),
            audio_url: None,
            cover_letter: None,
            status: status.to_string(),
            ai_match_score: score,
            applied_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn evaluation(app: &ApplicationRow, score: i32) -> ShortlistEvaluationRow {
        ShortlistEvaluationRow {
            application_id: app.id,
            project_id: app.project_id,
            match_score: score,
            strengths: vec!["Range".to_string()],
            concerns: vec![],
            recommendation: "Strong".to_string(),
            evaluated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_membership_and_order() {
        let ai_pass = application("pending", Some(72));
        let ai_fail = application("pending", Some(30));
        let manual = application("shortlisted", None);
        let winner = application("shortlisted", Some(88));
        let rejected = application("rejected", Some(0));

        let evaluations = vec![
            evaluation(&ai_pass, 72),
            evaluation(&ai_fail, 30),
            evaluation(&winner, 88),
        ];
        let mut names = HashMap::new();
        names.insert(winner.talent_id, "Ana Ruiz".to_string());

        let apps = vec![
            ai_pass.clone(),
            ai_fail.clone(),
            manual.clone(),
            winner.clone(),
            rejected,
        ];
        let data = build_shortlist_data(&apps, &evaluations, &names, winner.id);

        let ids: Vec<Uuid> = data.iter().map(|e| e.application_id).collect();
        assert_eq!(ids, vec![winner.id, ai_pass.id, manual.id]);
        assert!(data[0].selected);
        assert_eq!(data[0].talent_name, "Ana Ruiz");
        assert_eq!(data[0].strengths, vec!["Range".to_string()]);
        assert!(!data[1].selected);
        assert_eq!(data[2].talent_name, "Unknown");
        assert_eq!(data[2].match_score, None);
        assert_eq!(data[2].recommendation, None);
    }

    #[test]
    fn test_winner_without_evaluation_included() {
        let winner = application("pending", None);
        let data = build_shortlist_data(&[winner.clone()], &[], &HashMap::new(), winner.id);
        assert_eq!(data.len(), 1);
        assert!(data[0].selected);
    }

    #[test]
    fn test_dedup_ids_keeps_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(dedup_ids(&[a, b, a]), vec![a, b]);
    }
}

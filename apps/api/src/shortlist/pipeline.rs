//! AI shortlist pipeline for one project:
//! load → pre-filter → persist auto-rejections → score → persist scores → cut.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::service::load_candidates;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::project::ProjectRoleRow;
use crate::projects::repository::{fetch_roles, require_owned_project};
use crate::shortlist::prefilter::{rejection_reasons, requirements_for_application};
use crate::shortlist::scorer::{normalize_evaluations, shortlist_cut, ScoredApplicant};
use crate::shortlist::Candidate;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ShortlistedApplicant {
    pub application_id: Uuid,
    pub talent_id: Uuid,
    pub talent_name: String,
    pub avatar_url: Option<String>,
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
    pub application: ApplicationRow,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoRejection {
    pub application_id: Uuid,
    pub talent_id: Uuid,
    pub talent_name: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShortlistResponse {
    pub shortlisted_applicants: Vec<ShortlistedApplicant>,
    pub auto_rejected: Vec<AutoRejection>,
    /// Applicants the scorer was asked to evaluate.
    pub evaluated_count: usize,
}

pub async fn run_ai_shortlist(
    state: &AppState,
    project_id: Uuid,
    director_id: Uuid,
) -> Result<ShortlistResponse, AppError> {
    // 1. Project and roles
    let project = require_owned_project(&state.db, project_id, director_id).await?;
    let roles = fetch_roles(&state.db, project_id).await?;

    // 2-3. Applicants with profiles and signed videos
    let candidates = load_candidates(state, project_id).await?;
    if candidates.is_empty() {
        info!("Project {project_id}: no applications to shortlist");
        return Ok(ShortlistResponse::default());
    }

    // 4. Physical pre-filter
    let (qualified, rejected) = partition_candidates(candidates, &roles);

    // 5. Persist auto-rejections
    let auto_rejected: Vec<AutoRejection> = rejected
        .iter()
        .map(|(c, reasons)| AutoRejection {
            application_id: c.application.id,
            talent_id: c.application.talent_id,
            talent_name: c.display_name(),
            reasons: reasons.clone(),
        })
        .collect();
    persist_auto_rejections(&state.db, &auto_rejected).await?;

    info!(
        "Project {project_id}: {} qualified, {} auto-rejected",
        qualified.len(),
        auto_rejected.len()
    );

    // 6. Nothing left to score
    if qualified.is_empty() {
        return Ok(ShortlistResponse {
            shortlisted_applicants: Vec::new(),
            auto_rejected,
            evaluated_count: 0,
        });
    }

    // 7. Score
    let evaluations = state
        .shortlist_scorer
        .score(&project, &roles, &qualified)
        .await?;

    // 8. Validate and persist
    let known: HashSet<Uuid> = qualified.iter().map(|c| c.application.id).collect();
    let scored = normalize_evaluations(evaluations, &known);
    if scored.len() < qualified.len() {
        warn!(
            "Project {project_id}: scorer returned {} usable evaluation(s) for {} applicant(s)",
            scored.len(),
            qualified.len()
        );
    }
    persist_scores(&state.db, project_id, &scored).await?;

    // 9. Cut and enrich
    let shortlisted_applicants = assemble_shortlist(&shortlist_cut(&scored), &qualified);
    info!(
        "Project {project_id}: {} applicant(s) shortlisted by AI",
        shortlisted_applicants.len()
    );

    Ok(ShortlistResponse {
        shortlisted_applicants,
        auto_rejected,
        evaluated_count: qualified.len(),
    })
}

/// Splits applicants into those who pass the physical pre-filter and those
/// who do not, with the reasons for each failure.
pub fn partition_candidates(
    candidates: Vec<Candidate>,
    roles: &[ProjectRoleRow],
) -> (Vec<Candidate>, Vec<(Candidate, Vec<String>)>) {
    let mut qualified = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        let requirements = requirements_for_application(candidate.application.role_id, roles);
        let reasons = rejection_reasons(candidate.talent.as_ref(), &requirements);
        if reasons.is_empty() {
            qualified.push(candidate);
        } else {
            info!(
                "Auto-rejecting application {} ({}): {}",
                candidate.application.id,
                candidate.display_name(),
                reasons.join("; ")
            );
            rejected.push((candidate, reasons));
        }
    }

    (qualified, rejected)
}

/// Joins shortlist scores with the applicant data, keeping the score order.
pub fn assemble_shortlist(
    cut: &[ScoredApplicant],
    candidates: &[Candidate],
) -> Vec<ShortlistedApplicant> {
    let by_id: HashMap<Uuid, &Candidate> = candidates
        .iter()
        .map(|c| (c.application.id, c))
        .collect();

    cut.iter()
        .filter_map(|s| {
            let candidate = by_id.get(&s.application_id)?;
            let mut application = candidate.application.clone();
            application.ai_match_score = Some(s.match_score);
            Some(ShortlistedApplicant {
                application_id: s.application_id,
                talent_id: application.talent_id,
                talent_name: candidate.display_name(),
                avatar_url: candidate.profile.as_ref().and_then(|p| p.avatar_url.clone()),
                match_score: s.match_score,
                strengths: s.strengths.clone(),
                concerns: s.concerns.clone(),
                recommendation: s.recommendation.clone(),
                application,
                video_url: candidate.video_url.clone(),
            })
        })
        .collect()
}

async fn persist_auto_rejections(pool: &PgPool, rejected: &[AutoRejection]) -> Result<(), AppError> {
    if rejected.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = rejected.iter().map(|r| r.application_id).collect();
    sqlx::query(
        "UPDATE applications SET status = $2, ai_match_score = 0, updated_at = now() WHERE id = ANY($1)",
    )
    .bind(&ids)
    .bind(ApplicationStatus::Rejected.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

async fn persist_scores(
    pool: &PgPool,
    project_id: Uuid,
    scored: &[ScoredApplicant],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for s in scored {
        sqlx::query("UPDATE applications SET ai_match_score = $2, updated_at = now() WHERE id = $1")
            .bind(s.application_id)
            .bind(s.match_score)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO shortlist_evaluations
                (application_id, project_id, match_score, strengths, concerns, recommendation)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (application_id) DO UPDATE SET
                match_score    = EXCLUDED.match_score,
                strengths      = EXCLUDED.strengths,
                concerns       = EXCLUDED.concerns,
                recommendation = EXCLUDED.recommendation,
                evaluated_at   = now()
            "#,
        )
        .bind(s.application_id)
        .bind(project_id)
        .bind(s.match_score)
        .bind(&s.strengths)
        .bind(&s.concerns)
        .bind(&s.recommendation)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{PublicProfileRow, TalentProfileRow};
    use chrono::Utc;
    use serde_json::json;

    fn candidate(name: &str, role_id: Option<Uuid>, height_cm: Option<i32>) -> Candidate {
        let talent_id = Uuid::new_v4();
        Candidate {
            application: ApplicationRow {
                id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                role_id,
                talent_id,
                video_url: "reel.mp4".to_string(),
                audio_url: None,
                cover_letter: None,
                status: "pending".to_string(),
                ai_match_score: None,
                applied_at: Utc::now(),
                updated_at: Utc::now(),
            },
            profile: Some(PublicProfileRow {
                user_id: talent_id,
                full_name: Some(name.to_string()),
                avatar_url: Some(format!("https://cdn/{name}.png")),
                bio: None,
                user_type: "talent".to_string(),
                created_at: Utc::now(),
            }),
            talent: Some(TalentProfileRow {
                height_cm,
                ..Default::default()
            }),
            video_url: None,
        }
    }

    fn role(min_height: i32) -> ProjectRoleRow {
        ProjectRoleRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_name: "Lead".to_string(),
            role_description: None,
            emotions: None,
            requirements: Some(json!({ "minHeight": min_height })),
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    fn scored(id: Uuid, score: i32) -> ScoredApplicant {
        ScoredApplicant {
            application_id: id,
            match_score: score,
            strengths: vec!["Presence".to_string()],
            concerns: vec![],
            recommendation: "Call back".to_string(),
        }
    }

    #[test]
    fn test_partition_by_applied_role() {
        let tall_role = role(185);
        let short_role = role(150);
        let roles = vec![tall_role.clone(), short_role.clone()];

        let fits = candidate("Ana", Some(short_role.id), Some(170));
        let too_short = candidate("Bo", Some(tall_role.id), Some(170));
        let unknown_height = candidate("Cy", Some(tall_role.id), None);

        let (qualified, rejected) =
            partition_candidates(vec![fits.clone(), too_short.clone(), unknown_height], &roles);

        assert_eq!(qualified.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0.application.id, too_short.application.id);
        assert_eq!(
            rejected[0].1,
            vec!["Height below minimum (185cm required)".to_string()]
        );
        assert!(qualified.iter().any(|c| c.application.id == fits.application.id));
    }

    #[test]
    fn test_partition_without_role_checks_all_roles() {
        let roles = vec![role(150), role(185)];
        let (qualified, rejected) = partition_candidates(vec![candidate("Ana", None, Some(170))], &roles);
        assert!(qualified.is_empty());
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn test_assemble_keeps_order_and_enriches() {
        let a = candidate("Ana", None, None);
        let b = candidate("Bo", None, None);
        let cut = vec![scored(b.application.id, 91), scored(a.application.id, 64)];

        let list = assemble_shortlist(&cut, &[a.clone(), b.clone()]);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].talent_name, "Bo");
        assert_eq!(list[0].match_score, 91);
        assert_eq!(list[0].application.ai_match_score, Some(91));
        assert_eq!(list[0].talent_id, b.application.talent_id);
        assert_eq!(list[1].avatar_url.as_deref(), Some("https://cdn/Ana.png"));
    }

    #[test]
    fn test_assemble_skips_unknown_ids() {
        let a = candidate("Ana", None, None);
        let list = assemble_shortlist(&[scored(Uuid::new_v4(), 99)], &[a]);
        assert!(list.is_empty());
    }
}

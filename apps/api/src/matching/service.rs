use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::cache_key;
use crate::errors::AppError;
use crate::llm_client::LlmCall;
use crate::matching::analysis::{
    clean_reworded, compose_role_description, filter_recommendations, recommendation_limit,
    CandidateRecommendation, ProfileAnalysis, RawProfileAnalysis, RawRecommendationSet,
    RawTalentMatch, RewordedDescription, TalentMatch, TALENT_POOL_SIZE,
};
use crate::matching::prompts::{
    build_profile_analysis_prompt, build_recommend_prompt, build_reword_prompt,
    build_talent_match_prompt, casting_assistant_system, casting_director_system,
    talent_agent_system, COPYWRITER_SYSTEM,
};
use crate::profiles::repository::{
    count_credits, count_media, fetch_public_profile, fetch_public_profiles, fetch_talent_pool,
    fetch_talent_profile,
};
use crate::projects::repository::{fetch_role, fetch_roles, require_project};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub project_id: Uuid,
    pub role_id: Uuid,
    pub recommendations: Vec<CandidateRecommendation>,
    /// True when served from the recommendation cache.
    pub cached: bool,
}

pub async fn analyze_profile(state: &AppState, user_id: Uuid) -> Result<ProfileAnalysis, AppError> {
    let talent = fetch_talent_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Talent profile for {user_id} not found")))?;
    let name = fetch_public_profile(&state.db, user_id)
        .await?
        .and_then(|p| p.full_name);
    let media_count = count_media(&state.db, talent.id).await?;

    let prompt = build_profile_analysis_prompt(name.as_deref(), &talent, media_count);
    let system = talent_agent_system();
    let raw: RawProfileAnalysis = state
        .llm
        .call_json_object(LlmCall::text(&system, &prompt))
        .await
        .map_err(|e| AppError::Llm(format!("Profile analysis failed: {e}")))?;

    let analysis = ProfileAnalysis::from(raw);
    info!(
        "Profile {user_id} analysed: overall {}, completeness {}",
        analysis.overall_score, analysis.completeness
    );
    Ok(analysis)
}

pub async fn match_talent(
    state: &AppState,
    talent_user_id: Uuid,
    role_id: Uuid,
) -> Result<TalentMatch, AppError> {
    let talent = fetch_talent_profile(&state.db, talent_user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Talent profile for {talent_user_id} not found"))
        })?;
    let role = fetch_role(&state.db, role_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Role {role_id} not found")))?;
    let credit_count = count_credits(&state.db, talent.id).await?;

    let prompt = build_talent_match_prompt(&talent, credit_count, &role);
    let system = casting_assistant_system();
    let raw: RawTalentMatch = state
        .llm
        .call_json_object(LlmCall::text(&system, &prompt))
        .await
        .map_err(|e| AppError::Llm(format!("Talent match failed: {e}")))?;

    let result = TalentMatch::from(raw);
    info!(
        "Talent {talent_user_id} vs role {role_id}: {}",
        result.match_score
    );
    Ok(result)
}

/// Ranks the most recently active talent against one role of a project.
/// Results are cached per project, role and limit.
pub async fn recommend_candidates(
    state: &AppState,
    project_id: Uuid,
    role_id: Option<Uuid>,
    limit: Option<i64>,
) -> Result<RecommendationsResponse, AppError> {
    let project = require_project(&state.db, project_id).await?;
    let roles = fetch_roles(&state.db, project_id).await?;
    let role = match role_id {
        Some(id) => roles.iter().find(|r| r.id == id).ok_or_else(|| {
            AppError::Validation(format!("Role {id} does not belong to project {project_id}"))
        })?,
        None => roles
            .first()
            .ok_or_else(|| AppError::Validation(format!("Project {project_id} has no roles")))?,
    };
    let limit = recommendation_limit(limit);

    let (project_part, role_part, limit_part) =
        (project_id.to_string(), role.id.to_string(), limit.to_string());
    let key = cache_key(
        "recommendations",
        &[project_part.as_str(), role_part.as_str(), limit_part.as_str()],
    );
    if let Some(recommendations) = state.cache.get_json::<Vec<CandidateRecommendation>>(&key).await
    {
        return Ok(RecommendationsResponse {
            project_id,
            role_id: role.id,
            recommendations,
            cached: true,
        });
    }

    let pool = fetch_talent_pool(&state.db, TALENT_POOL_SIZE).await?;
    if pool.is_empty() {
        info!("Project {project_id}: no talent to recommend");
        return Ok(RecommendationsResponse {
            project_id,
            role_id: role.id,
            recommendations: Vec::new(),
            cached: false,
        });
    }

    let prompt = build_recommend_prompt(&project, role, &pool, limit);
    let system = casting_director_system();
    let raw: RawRecommendationSet = state
        .llm
        .call_json_object(LlmCall::text(&system, &prompt))
        .await
        .map_err(|e| AppError::Llm(format!("Candidate recommendation failed: {e}")))?;

    let known: HashSet<Uuid> = pool.iter().map(|(t, _)| t.user_id).collect();
    let mut recommendations = filter_recommendations(raw, &known, limit);

    let ids: Vec<Uuid> = recommendations.iter().map(|r| r.talent_id).collect();
    let profiles = fetch_public_profiles(&state.db, &ids).await?;
    for rec in &mut recommendations {
        let profile = profiles.get(&rec.talent_id);
        rec.talent_name = profile
            .and_then(|p| p.full_name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        rec.avatar_url = profile.and_then(|p| p.avatar_url.clone());
    }

    info!(
        "Project {project_id}, role {}: {} recommendation(s) from a pool of {}",
        role.id,
        recommendations.len(),
        pool.len()
    );
    state.cache.put_json(&key, &recommendations).await;

    Ok(RecommendationsResponse {
        project_id,
        role_id: role.id,
        recommendations,
        cached: false,
    })
}

/// Rewrites a project's casting call for applicants. Falls back to the
/// original text whenever the model cannot produce one.
pub async fn reword_role_description(
    state: &AppState,
    project_id: Uuid,
) -> Result<RewordedDescription, AppError> {
    let project = require_project(&state.db, project_id).await?;
    let roles = fetch_roles(&state.db, project_id).await?;
    let original = compose_role_description(&project, &roles);

    let prompt = build_reword_prompt(&original);
    let reply = match state.llm.call(LlmCall::text(COPYWRITER_SYSTEM, &prompt)).await {
        Ok(response) => response.text().and_then(clean_reworded),
        Err(e) => {
            warn!("Rewording for project {project_id} failed, returning original: {e}");
            None
        }
    };

    Ok(match reply {
        Some(reworded_description) => RewordedDescription {
            original_description: original,
            reworded_description,
            reworded: true,
        },
        None => RewordedDescription::unchanged(original),
    })
}

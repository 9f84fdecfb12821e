// Matching LLM prompt templates.

use crate::llm_client::prompts::{join_or_na, or_na, FAIRNESS_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::models::profile::TalentProfileRow;
use crate::models::project::{ProjectRoleRow, ProjectRow};
use crate::profiles::physical::{
    describe_appearance, describe_height, describe_skill_counts, describe_weight,
};
use crate::projects::requirements::RoleRequirements;

pub fn talent_agent_system() -> String {
    format!("You are a professional talent agent AI. {JSON_ONLY_INSTRUCTION}")
}

pub fn casting_assistant_system() -> String {
    format!("You are a professional casting AI assistant. {JSON_ONLY_INSTRUCTION}")
}

pub fn casting_director_system() -> String {
    format!("You are a professional casting director AI. {JSON_ONLY_INSTRUCTION}")
}

pub const COPYWRITER_SYSTEM: &str = "You are a casting copywriter. \
    Reply with the rewritten description only, as plain text without a preamble or quotes.";

const PROFILE_ANALYSIS_TEMPLATE: &str = r#"You are an AI casting consultant analyzing a talent profile for completeness and marketability.

PROFILE DATA:
- Name: {name}
- Physical Details: {height}, {weight}
- Appearance: {appearance}
- Skills: {skills}
- Location: {location}
- Union: {union}
- Media Items: {media_count}
- Profile Completion: {completion}%

Analyze this profile and provide actionable improvement suggestions. Consider:
1. Profile completeness
2. Marketability factors
3. Missing critical information
4. Competitive positioning

Respond with a JSON object:
{
  "overallScore": <number 0-100>,
  "completeness": <number 0-100>,
  "marketability": <number 0-100>,
  "strengths": ["strength1", "strength2", "strength3"],
  "improvements": ["improvement1", "improvement2", "improvement3"],
  "priorityActions": ["action1", "action2"],
  "summary": "<brief 2-3 sentence summary>"
}"#;

pub fn build_profile_analysis_prompt(
    name: Option<&str>,
    talent: &TalentProfileRow,
    media_count: i64,
) -> String {
    PROFILE_ANALYSIS_TEMPLATE
        .replace("{name}", name.unwrap_or("Not provided"))
        .replace("{height}", &describe_height(talent))
        .replace("{weight}", &describe_weight(talent))
        .replace("{appearance}", &describe_appearance(talent))
        .replace("{skills}", &describe_skill_counts(talent))
        .replace("{location}", &or_na(talent.location.as_deref()))
        .replace("{union}", &or_na(talent.union_status.as_deref()))
        .replace("{media_count}", &media_count.to_string())
        .replace(
            "{completion}",
            &talent.profile_completion_percentage.to_string(),
        )
}

const TALENT_MATCH_TEMPLATE: &str = r#"You are an AI casting assistant analyzing talent-role compatibility.

TALENT PROFILE:
- Skills: Languages: {languages}; Instruments: {instruments}; Combat: {combat}; Athletic: {athletic}; Special: {special}
- Experience: {credit_count} credits
- Physical: Height {height}, {weight}, {appearance}
- Location: {location}
- Union Status: {union}

PROJECT ROLE:
- Role: {role_name}
- Description: {role_description}
- Requirements: {requirements}

Analyze the match between this talent and role. Consider:
1. Skill alignment (40%)
2. Physical requirements fit (30%)
3. Experience level (20%)
4. Practical factors like location and union status (10%)

Respond with a JSON object:
{
  "matchScore": <number 0-100>,
  "strengths": ["strength1", "strength2", "strength3"],
  "concerns": ["concern1", "concern2"],
  "recommendation": "<brief recommendation>"
}

{fairness}"#;

pub fn build_talent_match_prompt(
    talent: &TalentProfileRow,
    credit_count: i64,
    role: &ProjectRoleRow,
) -> String {
    let requirements = RoleRequirements::from_json(role.requirements.as_ref());
    TALENT_MATCH_TEMPLATE
        .replace("{languages}", &join_or_na(talent.languages.as_deref()))
        .replace("{instruments}", &join_or_na(talent.instruments.as_deref()))
        .replace("{combat}", &join_or_na(talent.combat_skills.as_deref()))
        .replace("{athletic}", &join_or_na(talent.athletic_skills.as_deref()))
        .replace("{special}", &join_or_na(talent.special_skills.as_deref()))
        .replace("{credit_count}", &credit_count.to_string())
        .replace("{height}", &describe_height(talent))
        .replace("{weight}", &describe_weight(talent))
        .replace("{appearance}", &describe_appearance(talent))
        .replace("{location}", &or_na(talent.location.as_deref()))
        .replace("{union}", &or_na(talent.union_status.as_deref()))
        .replace("{role_name}", &role.role_name)
        .replace("{role_description}", &or_na(role.role_description.as_deref()))
        .replace("{requirements}", &requirements.to_prompt_json())
        .replace("{fairness}", FAIRNESS_INSTRUCTION)
}

const RECOMMEND_TEMPLATE: &str = r#"You are an AI casting director analyzing talent for a specific role.

PROJECT: {title}
ROLE: {role_name}
DESCRIPTION: {role_description}
REQUIREMENTS: {requirements}

TALENT POOL ({pool_size} candidates):
{pool}

Analyze each candidate and select the top {limit} best matches. Consider:
1. Skill alignment with role requirements
2. Physical fit for the character
3. Experience level appropriateness
4. Practical factors (location, union status)

Respond with a JSON object:
{
  "recommendations": [
    {
      "talentId": "<uuid>",
      "matchScore": <number 0-100>,
      "reasoning": "<brief explanation>",
      "keyStrengths": ["strength1", "strength2"]
    }
  ]
}

Return at most {limit} recommendations, ordered by match score (highest first). Use the exact IDs given.

{fairness}"#;

pub fn build_recommend_prompt(
    project: &ProjectRow,
    role: &ProjectRoleRow,
    pool: &[(TalentProfileRow, i64)],
    limit: usize,
) -> String {
    let requirements = RoleRequirements::from_json(role.requirements.as_ref());
    let pool_text = pool
        .iter()
        .enumerate()
        .map(|(i, (t, credits))| {
            format!(
                "{}. ID: {}\n   Skills: {}\n   Physical: {}, {}, {}\n   Location: {}, Union: {}\n   Experience: {} credits",
                i + 1,
                t.user_id,
                describe_skill_counts(t),
                describe_height(t),
                describe_weight(t),
                describe_appearance(t),
                or_na(t.location.as_deref()),
                or_na(t.union_status.as_deref()),
                credits
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    RECOMMEND_TEMPLATE
        .replace("{title}", &project.title)
        .replace("{role_name}", &role.role_name)
        .replace("{role_description}", &or_na(role.role_description.as_deref()))
        .replace("{requirements}", &requirements.to_prompt_json())
        .replace("{pool_size}", &pool.len().to_string())
        .replace("{pool}", &pool_text)
        .replace("{limit}", &limit.to_string())
        .replace("{fairness}", FAIRNESS_INSTRUCTION)
}

const REWORD_TEMPLATE: &str = r#"Rewrite the following casting call so it speaks directly to performers who are about to record an audition video.
Keep every concrete requirement (roles, physical requirements, skills, dates). Make it warm, clear and encouraging, in at most 150 words.
Do not invent details that are not in the original.

ORIGINAL:
{original}"#;

pub fn build_reword_prompt(original: &str) -> String {
    REWORD_TEMPLATE.replace("{original}", original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn role() -> ProjectRoleRow {
        ProjectRoleRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_name: "Detective Hale".to_string(),
            role_description: None,
            emotions: None,
            requirements: Some(json!({ "gender": "female", "ageMin": 30 })),
            is_featured: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_analysis_prompt() {
        let talent = TalentProfileRow {
            height_feet: Some(5),
            height_inches: Some(9),
            weight: Some(140),
            profile_completion_percentage: 58,
            ..Default::default()
        };
        let prompt = build_profile_analysis_prompt(None, &talent, 3);
        assert!(prompt.contains("- Name: Not provided"));
        assert!(prompt.contains("- Physical Details: 5'9\", 140 lbs"));
        assert!(prompt.contains("- Media Items: 3"));
        assert!(prompt.contains("- Profile Completion: 58%"));
        assert!(prompt.contains("\"priorityActions\""));
    }

    #[test]
    fn test_match_prompt_includes_role_and_requirements() {
        let talent = TalentProfileRow {
            languages: Some(vec!["Spanish".into()]),
            ..Default::default()
        };
        let prompt = build_talent_match_prompt(&talent, 4, &role());
        assert!(prompt.contains("- Role: Detective Hale"));
        assert!(prompt.contains("- Description: N/A"));
        assert!(prompt.contains("Languages: Spanish"));
        assert!(prompt.contains("- Experience: 4 credits"));
        assert!(prompt.contains("\"gender\":[\"female\"]"));
        assert!(prompt.contains(FAIRNESS_INSTRUCTION));
    }

    #[test]
    fn test_recommend_prompt_lists_pool_by_user_id() {
        let project = ProjectRow {
            id: Uuid::new_v4(),
            director_id: Uuid::new_v4(),
            title: "Cold Harbor".to_string(),
            project_type: "series".to_string(),
            description: None,
            production_company: None,
            location: None,
            deadline: None,
            shoot_start_date: None,
            shoot_end_date: None,
            remote_auditions_only: false,
            mood_board_urls: None,
            is_draft: false,
            status: "open".to_string(),
            selected_talent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let a = TalentProfileRow {
            user_id: Uuid::new_v4(),
            height_cm: Some(170),
            ..Default::default()
        };
        let b = TalentProfileRow {
            user_id: Uuid::new_v4(),
            ..Default::default()
        };
        let prompt = build_recommend_prompt(&project, &role(), &[(a.clone(), 2), (b.clone(), 0)], 5);
        assert!(prompt.contains("TALENT POOL (2 candidates):"));
        assert!(prompt.contains(&format!("1. ID: {}", a.user_id)));
        assert!(prompt.contains(&format!("2. ID: {}", b.user_id)));
        assert!(prompt.contains("Physical: 170 cm"));
        assert!(prompt.contains("Experience: 2 credits"));
        assert!(prompt.contains("select the top 5 best matches"));
    }

    #[test]
    fn test_reword_prompt() {
        let prompt = build_reword_prompt("Multiple roles available");
        assert!(prompt.ends_with("ORIGINAL:\nMultiple roles available"));
    }
}

// Shortlisting LLM prompt templates.

use crate::llm_client::prompts::{join_or_na, or_na, FAIRNESS_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::models::project::{ProjectRoleRow, ProjectRow};
use crate::profiles::physical::{describe_height, describe_weight};
use crate::projects::requirements::RoleRequirements;
use crate::shortlist::Candidate;

pub fn shortlist_system() -> String {
    format!("You are a professional casting director. {JSON_ONLY_INSTRUCTION}")
}

const SHORTLIST_PROMPT_TEMPLATE: &str = r#"You are an expert casting director AI analyzing applicants for a film/TV project. Evaluate each candidate thoroughly.

{project}

APPLICANTS:
{applicants}

EVALUATION CRITERIA:
1. Physical Match (30%): Height, weight, gender, looks/types matching role requirements
2. Skills & Experience (25%): Special skills, athletic abilities, instruments, languages relevant to role
3. Professional Profile (20%): Union status, location convenience, overall presentation
4. Intangibles (15%): Cover letter quality, enthusiasm, unique qualities
5. Video Performance (10%): If video available, assess presence and energy

SCORING:
- 90-100: Exceptional match, strongly recommend for shortlist
- 75-89: Very good match, solid candidate
- 50-74: Acceptable match, consider if limited options
- Below 50: Not recommended for this role

For each applicant provide a realistic match score (0-100), 2-4 key strengths,
1-3 concerns, and a 1-2 sentence recommendation.

Return ONLY a JSON array, one element per applicant, using the exact Application ID given:
[
  {
    "applicationId": "uuid",
    "matchScore": 78,
    "strengths": ["Perfect height match for lead role", "Experienced with action sequences"],
    "concerns": ["Location requires relocation"],
    "recommendation": "Strong candidate with excellent physical match and action experience."
  }
]

{fairness}"#;

pub fn build_shortlist_prompt(
    project: &ProjectRow,
    roles: &[ProjectRoleRow],
    candidates: &[Candidate],
) -> String {
    let applicants = candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| describe_applicant(idx + 1, c))
        .collect::<Vec<_>>()
        .join("\n");

    SHORTLIST_PROMPT_TEMPLATE
        .replace("{project}", &describe_project(project, roles))
        .replace("{applicants}", &applicants)
        .replace("{fairness}", FAIRNESS_INSTRUCTION)
}

pub fn describe_project(project: &ProjectRow, roles: &[ProjectRoleRow]) -> String {
    let roles_text = if roles.is_empty() {
        "N/A".to_string()
    } else {
        roles
            .iter()
            .map(|r| {
                let requirements = RoleRequirements::from_json(r.requirements.as_ref());
                format!(
                    "  - {}: {}\n    Required emotions: {}\n    Requirements: {}",
                    r.role_name,
                    r.role_description.as_deref().unwrap_or("N/A"),
                    join_or_na(r.emotions.as_deref()),
                    requirements.to_prompt_json()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Project: {}\nType: {}\nDescription: {}\n\nRoles:\n{}",
        project.title,
        project.project_type,
        project.description.as_deref().unwrap_or("N/A"),
        roles_text
    )
}

fn describe_applicant(number: usize, candidate: &Candidate) -> String {
    let name = candidate
        .profile
        .as_ref()
        .and_then(|p| p.full_name.as_deref())
        .unwrap_or("Unknown");
    let app = &candidate.application;

    let mut block = format!("Applicant {number}:\nName: {name}\n");
    match &candidate.talent {
        Some(t) => {
            block.push_str(&format!(
                "Gender: {}\nHeight: {}\nWeight: {}\nLocation: {}\nLanguages: {}\nSpecial Skills: {}\nAthletic Skills: {}\nInstruments: {}\nUnion Status: {}\nLooks/Types: {}\n",
                or_na(t.gender_identity.as_deref()),
                describe_height(t),
                describe_weight(t),
                or_na(t.location.as_deref()),
                join_or_na(t.languages.as_deref()),
                join_or_na(t.special_skills.as_deref()),
                join_or_na(t.athletic_skills.as_deref()),
                join_or_na(t.instruments.as_deref()),
                or_na(t.union_status.as_deref()),
                join_or_na(t.looks_types.as_deref()),
            ));
        }
        None => block.push_str("Talent profile: not provided\n"),
    }
    block.push_str(&format!(
        "Cover Letter: {}\nVideo Available: {}\nApplication ID: {}\n",
        app.cover_letter.as_deref().unwrap_or("N/A"),
        if candidate.video_url.is_some() { "Yes" } else { "No" },
        app.id
    ));
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationRow;
    use crate::models::profile::{PublicProfileRow, TalentProfileRow};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn project() -> ProjectRow {
        ProjectRow {
            id: Uuid::new_v4(),
            director_id: Uuid::new_v4(),
            title: "Night Harbor".to_string(),
            project_type: "feature_film".to_string(),
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
        }
    }

    fn candidate(name: Option<&str>, talent: Option<TalentProfileRow>) -> Candidate {
        let talent_id = Uuid::new_v4();
        Candidate {
            application: ApplicationRow {
                id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                role_id: None,
                talent_id,
                video_url: "k.mp4".to_string(),
                audio_url: None,
                cover_letter: Some("I grew up on the docks.".to_string()),
                status: "pending".to_string(),
                ai_match_score: None,
                applied_at: Utc::now(),
                updated_at: Utc::now(),
            },
            profile: name.map(|n| PublicProfileRow {
                user_id: talent_id,
                full_name: Some(n.to_string()),
                avatar_url: None,
                bio: None,
                user_type: "talent".to_string(),
                created_at: Utc::now(),
            }),
            talent,
            video_url: Some("https://signed/k.mp4".to_string()),
        }
    }

    #[test]
    fn test_prompt_lists_every_applicant_with_id() {
        let a = candidate(Some("Ana Ruiz"), Some(TalentProfileRow::default()));
        let b = candidate(None, None);
        let prompt = build_shortlist_prompt(&project(), &[], &[a.clone(), b.clone()]);

        assert!(prompt.contains("Applicant 1:\nName: Ana Ruiz"));
        assert!(prompt.contains("Applicant 2:\nName: Unknown"));
        assert!(prompt.contains(&format!("Application ID: {}", a.application.id)));
        assert!(prompt.contains(&format!("Application ID: {}", b.application.id)));
        assert!(prompt.contains("Talent profile: not provided"));
        assert!(prompt.contains("Video Available: Yes"));
        assert!(!prompt.contains("{applicants}"));
    }

    #[test]
    fn test_project_block_includes_role_requirements() {
        let role = ProjectRoleRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_name: "Harbor Master".to_string(),
            role_description: Some("Weathered, commanding".to_string()),
            emotions: Some(vec!["stern".to_string(), "grief".to_string()]),
            requirements: Some(json!({ "minHeight": 180 })),
            is_featured: true,
            created_at: Utc::now(),
        };
        let text = describe_project(&project(), &[role]);
        assert!(text.contains("Project: Night Harbor"));
        assert!(text.contains("Description: N/A"));
        assert!(text.contains("- Harbor Master: Weathered, commanding"));
        assert!(text.contains("Required emotions: stern, grief"));
        assert!(text.contains("\"min_height\":180.0"));
    }

    #[test]
    fn test_applicant_physical_fields() {
        let talent = TalentProfileRow {
            height_cm: Some(168),
            languages: Some(vec!["English".into(), "Portuguese".into()]),
            union_status: Some("SAG-AFTRA".into()),
            ..Default::default()
        };
        let block = describe_applicant(3, &candidate(Some("Bea"), Some(talent)));
        assert!(block.contains("Height: 168 cm"));
        assert!(block.contains("Weight: N/A"));
        assert!(block.contains("Languages: English, Portuguese"));
        assert!(block.contains("Union Status: SAG-AFTRA"));
    }
}

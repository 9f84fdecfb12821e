// Audition evaluation prompt for the vision model.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::models::audition::AuditionRow;

pub const AUDITION_MAX_TOKENS: u32 = 2000;

const AUDITION_PROMPT_TEMPLATE: &str = r#"You are an expert casting director and emotion analyst. Analyze this audition video/image and provide a detailed evaluation.

ROLE REQUIREMENTS:
{role_description}

EMOTIONAL KEYWORDS DESIRED: {keywords}

ROLE ARCHETYPES TO CONSIDER:
- Hero/Protagonist: Confident, charismatic, courageous, determined
- Villain/Antagonist: Intimidating, manipulative, powerful, menacing
- Romantic Lead: Charming, empathetic, vulnerable, passionate
- Comedic Character: Energetic, expressive, good timing, humorous
- Dramatic Character: Intense, emotionally deep, authentic, range
- Supporting Role: Reliable, consistent, versatile, dependable

ANALYSIS REQUIRED:
1. Detect emotions present (happy, sad, angry, fear, surprise, disgust, neutral) with confidence scores
2. Evaluate emotional intensity (low, medium, high)
3. Assess face visibility and expressiveness
4. Evaluate technical quality (lighting, contrast, clarity)
5. Match performer to role requirements
6. Provide specific strengths and areas for improvement
7. Give casting recommendation

{json_only} Use this exact structure:
{
  "overall_match_score": <number 0-100>,
  "recommendation": "<strong_yes|yes|maybe|probably_not|no>",
  "emotions_detected": {
    "happy": <0-1>, "sad": <0-1>, "angry": <0-1>, "fear": <0-1>,
    "surprise": <0-1>, "disgust": <0-1>, "neutral": <0-1>
  },
  "strengths": ["strength1", "strength2", "strength3"],
  "improvements": ["improvement1", "improvement2"],
  "technical_notes": ["note1", "note2"],
  "detailed_analysis": {
    "emotional_intensity": "<low|medium|high>",
    "face_quality_score": <0-100>,
    "technical_quality_score": <0-100>,
    "emotion_match_score": <0-100>,
    "archetype_match": "<hero|villain|romantic_lead|comedic|dramatic|supporting>",
    "summary": "<2-3 sentence summary>"
  }
}"#;

pub fn build_audition_prompt(audition: &AuditionRow) -> String {
    let keywords = audition
        .emotional_keywords
        .as_ref()
        .filter(|k| !k.is_empty())
        .map(|k| k.join(", "))
        .unwrap_or_else(|| "none specified".to_string());

    AUDITION_PROMPT_TEMPLATE
        .replace("{role_description}", &audition.role_description)
        .replace("{keywords}", &keywords)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn audition(keywords: Option<Vec<String>>) -> AuditionRow {
        AuditionRow {
            id: Uuid::new_v4(),
            talent_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            role_id: None,
            role_description: "A grieving lighthouse keeper".to_string(),
            emotional_keywords: keywords,
            video_url: "auditions/take1.mp4".to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_fills_role_and_keywords() {
        let prompt = build_audition_prompt(&audition(Some(vec!["grief".into(), "resolve".into()])));
        assert!(prompt.contains("ROLE REQUIREMENTS:\nA grieving lighthouse keeper"));
        assert!(prompt.contains("EMOTIONAL KEYWORDS DESIRED: grief, resolve"));
        assert!(!prompt.contains("{keywords}"));
        assert!(!prompt.contains("{json_only}"));
    }

    #[test]
    fn test_prompt_without_keywords() {
        let prompt = build_audition_prompt(&audition(Some(vec![])));
        assert!(prompt.contains("EMOTIONAL KEYWORDS DESIRED: none specified"));
    }
}

//! Audition evaluation as returned by the vision model, and its clean-up
//! before storage: scores clamped to 0–100, emotions to 0–1, and an
//! unrecognised recommendation derived from the score.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::lenient::{clamp_percent, number_or_zero, optional_number, score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongYes,
    Yes,
    Maybe,
    ProbablyNot,
    No,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongYes => "strong_yes",
            Recommendation::Yes => "yes",
            Recommendation::Maybe => "maybe",
            Recommendation::ProbablyNot => "probably_not",
            Recommendation::No => "no",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "strong_yes" => Some(Recommendation::StrongYes),
            "yes" => Some(Recommendation::Yes),
            "maybe" => Some(Recommendation::Maybe),
            "probably_not" => Some(Recommendation::ProbablyNot),
            "no" => Some(Recommendation::No),
            _ => None,
        }
    }

    pub fn from_score(score: i32) -> Self {
        match score {
            85.. => Recommendation::StrongYes,
            70..=84 => Recommendation::Yes,
            50..=69 => Recommendation::Maybe,
            30..=49 => Recommendation::ProbablyNot,
            _ => Recommendation::No,
        }
    }
}

/// Confidence per basic emotion, 0–1. Missing emotions read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionScores {
    #[serde(deserialize_with = "number_or_zero")]
    pub happy: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub sad: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub angry: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub fear: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub surprise: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub disgust: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub neutral: f64,
}

impl EmotionScores {
    fn clamped(self) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            happy: c(self.happy),
            sad: c(self.sad),
            angry: c(self.angry),
            fear: c(self.fear),
            surprise: c(self.surprise),
            disgust: c(self.disgust),
            neutral: c(self.neutral),
        }
    }

    /// The strongest emotion, if any registers above zero.
    pub fn dominant(&self) -> Option<&'static str> {
        [
            ("happy", self.happy),
            ("sad", self.sad),
            ("angry", self.angry),
            ("fear", self.fear),
            ("surprise", self.surprise),
            ("disgust", self.disgust),
            ("neutral", self.neutral),
        ]
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedAnalysis {
    pub emotional_intensity: Option<String>,
    #[serde(deserialize_with = "optional_number")]
    pub face_quality_score: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub technical_quality_score: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub emotion_match_score: Option<f64>,
    pub archetype_match: Option<String>,
    pub summary: Option<String>,
    /// Anything else the model adds is kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DetailedAnalysis {
    fn clamped(self) -> Self {
        Self {
            face_quality_score: self.face_quality_score.map(clamp_percent),
            technical_quality_score: self.technical_quality_score.map(clamp_percent),
            emotion_match_score: self.emotion_match_score.map(clamp_percent),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditionEvaluation {
    #[serde(alias = "overallMatchScore", deserialize_with = "number_or_zero")]
    pub overall_match_score: f64,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default, alias = "emotionsDetected")]
    pub emotions_detected: EmotionScores,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default, alias = "technicalNotes")]
    pub technical_notes: Vec<String>,
    #[serde(default, alias = "detailedAnalysis")]
    pub detailed_analysis: Option<DetailedAnalysis>,
}

/// An evaluation ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvaluation {
    pub overall_match_score: i32,
    pub recommendation: Recommendation,
    pub emotions_detected: EmotionScores,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub technical_notes: Vec<String>,
    pub detailed_analysis: Option<DetailedAnalysis>,
}

impl AuditionEvaluation {
    pub fn normalize(self) -> NormalizedEvaluation {
        let overall = score(self.overall_match_score);
        let recommendation = Recommendation::parse(&self.recommendation)
            .unwrap_or_else(|| Recommendation::from_score(overall));
        NormalizedEvaluation {
            overall_match_score: overall,
            recommendation,
            emotions_detected: self.emotions_detected.clamped(),
            strengths: clean(self.strengths),
            improvements: clean(self.improvements),
            technical_notes: clean(self.technical_notes),
            detailed_analysis: self.detailed_analysis.map(DetailedAnalysis::clamped),
        }
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

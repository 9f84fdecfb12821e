// Applicant shortlisting: physical pre-filter → AI scoring → ranking → persistence,
// plus the director's manual shortlist and final selection.
// All model calls go through llm_client via the ApplicantScorer trait.

pub mod handlers;
pub mod pipeline;
pub mod prefilter;
pub mod prompts;
pub mod scorer;
pub mod selection;

use serde::Serialize;

use crate::models::application::ApplicationRow;
use crate::models::profile::{PublicProfileRow, TalentProfileRow};

/// An application with everything the pre-filter and the prompt need.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub application: ApplicationRow,
    pub profile: Option<PublicProfileRow>,
    pub talent: Option<TalentProfileRow>,
    /// Presigned URL; `None` when signing failed.
    pub video_url: Option<String>,
}

impl Candidate {
    pub fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.full_name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

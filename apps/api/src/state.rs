use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::Cache;
use crate::llm_client::LlmClient;
use crate::shortlist::scorer::ApplicantScorer;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Recommendation cache. Failures degrade to a live model call.
    pub cache: Cache,
    pub storage: Storage,
    pub llm: LlmClient,
    /// Scores pre-filtered applicants. Default: LlmApplicantScorer.
    pub shortlist_scorer: Arc<dyn ApplicantScorer>,
}

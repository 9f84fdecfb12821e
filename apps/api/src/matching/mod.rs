// Profile analysis, talent-role matching, candidate recommendations and
// applicant-facing role descriptions. All model calls go through llm_client.

pub mod analysis;
pub mod handlers;
pub mod prompts;
pub mod service;

pub mod completeness;
pub mod handlers;
pub mod physical;
pub mod repository;
pub mod validation;

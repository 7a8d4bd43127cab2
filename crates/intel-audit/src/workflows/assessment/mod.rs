//! Questionnaire scoring: keyword scorer, zone classifier, and outcome aggregation.
//!
//! Everything in this module is pure and safe to call from any number of threads.

mod catalog;
pub mod classifier;
pub mod domain;
mod outcome;
pub mod scorer;

pub use catalog::{CategoryDefinition, WasteCatalog, STANDARD_CATEGORIES};
pub use domain::{
    AssessmentOutcome, AssessmentResponse, AssessmentSubmission, CategoryId, ComplexityTier,
    WasteUrgency, ZoneResult,
};

/// Scores responses against the standard category table.
pub fn analyze(responses: &AssessmentResponse) -> AssessmentOutcome {
    WasteCatalog::standard().analyze(responses)
}

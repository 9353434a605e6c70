//! Accessor services: argument validation, path building, entity
//! conversion, and operation-named error wrapping over the document store.

pub mod assessment_service;
pub mod score_service;
pub mod validation;

pub use assessment_service::AssessmentService;
pub use score_service::{ScoreDraft, ScoreService};

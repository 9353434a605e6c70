//! Errors surfaced to accessor callers.

use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StoreError;

/// Errors that can occur in service layer operations.
///
/// Argument problems are rejected before any store call; everything else
/// wraps a [`StoreError`] under a message naming the operation that failed.
/// The fetch and list variants repeat the store error's rendering in their
/// own, because that is where the actionable detail (missing composite
/// index, permission denial) lives. Absence is never an error: lookups
/// return `Ok(None)`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required identifier was empty or malformed; nothing was sent to
    /// the store.
    #[error("invalid arguments: {0}")]
    InvalidArgument(String),
    /// Persisting a generated assessment failed.
    #[error("failed to save game assessment")]
    SaveAssessment(#[source] StoreError),
    /// Reading a single assessment failed.
    #[error("failed to fetch game assessment: {0}")]
    FetchAssessment(#[source] StoreError),
    /// Listing a module's assessments failed.
    #[error("failed to fetch game assessments for module: {0}")]
    ListAssessments(#[source] StoreError),
    /// Updating the approval flag failed.
    #[error("failed to update game assessment approval status")]
    SetApproval(#[source] StoreError),
    /// Deleting an assessment failed.
    #[error("failed to delete game assessment")]
    DeleteAssessment(#[source] StoreError),
    /// Persisting a user's score failed.
    #[error("failed to save user game score")]
    SaveScore(#[source] StoreError),
    /// Reading a user's score failed.
    #[error("failed to fetch user game score: {0}")]
    FetchScore(#[source] StoreError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidArgument(format!("validation failed: {err}"))
    }
}

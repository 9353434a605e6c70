//! Upsert and lookup of per-user game scores.

use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as Json};
use time::OffsetDateTime;
use tracing::{debug, error, info};
use validator::Validate;

use crate::{
    config::CollectionLayout,
    dao::{
        document::{Document, FieldValue},
        document_store::DocumentStore,
        models::{ScoreEntity, fields},
    },
    error::ServiceError,
    services::validation::{require_id, validate_document_id},
};

/// Caller input for a score upsert.
///
/// The three identifiers locate the assessment the score was earned on; the
/// payload (points, attempt history) is passed through opaquely. When
/// `completed_at` is absent the store's write-time clock is used.
#[derive(Debug, Clone, Validate)]
pub struct ScoreDraft {
    /// Assessment the score was earned on; doubles as the document id.
    #[validate(custom(function = validate_document_id))]
    pub assessment_id: String,
    /// Course owning the module.
    #[validate(custom(function = validate_document_id))]
    pub course_id: String,
    /// Module the assessment belongs to.
    #[validate(custom(function = validate_document_id))]
    pub module_id: String,
    /// Completion instant, when the caller wants to supply one.
    pub completed_at: Option<OffsetDateTime>,
    /// Opaque score and attempt details.
    pub payload: JsonMap<String, Json>,
}

impl ScoreDraft {
    /// A draft with no explicit completion instant.
    pub fn new(
        assessment_id: impl Into<String>,
        course_id: impl Into<String>,
        module_id: impl Into<String>,
        payload: JsonMap<String, Json>,
    ) -> Self {
        Self {
            assessment_id: assessment_id.into(),
            course_id: course_id.into(),
            module_id: module_id.into(),
            completed_at: None,
            payload,
        }
    }

    /// Record an explicit completion instant instead of the server clock.
    pub fn completed_at(mut self, instant: OffsetDateTime) -> Self {
        self.completed_at = Some(instant);
        self
    }
}

/// Accessor for the per-user score subtree.
#[derive(Clone)]
pub struct ScoreService {
    store: Arc<dyn DocumentStore>,
    layout: CollectionLayout,
}

impl ScoreService {
    /// Build an accessor over `store` using the given collection layout.
    pub fn new(store: Arc<dyn DocumentStore>, layout: CollectionLayout) -> Self {
        Self { store, layout }
    }

    /// Write a user's score with merge semantics, keyed by the assessment
    /// id so repeated submissions update one document instead of piling up.
    pub async fn save_user_score(
        &self,
        user_id: &str,
        draft: ScoreDraft,
    ) -> Result<(), ServiceError> {
        require_id(user_id, "user ID")?;
        draft.validate()?;

        let mut document = Document::from_json_map(draft.payload);
        document.set(fields::USER_ID, FieldValue::Text(user_id.to_owned()));
        document.set(
            fields::ASSESSMENT_ID,
            FieldValue::Text(draft.assessment_id.clone()),
        );
        document.set(fields::COURSE_ID, FieldValue::Text(draft.course_id));
        document.set(fields::MODULE_ID, FieldValue::Text(draft.module_id));
        document.set(
            fields::COMPLETED_AT,
            match draft.completed_at {
                Some(instant) => FieldValue::Timestamp(instant),
                None => FieldValue::ServerTimestamp,
            },
        );

        let path = self.layout.score_document(user_id, &draft.assessment_id);
        match self.store.merge(path, document).await {
            Ok(()) => {
                info!(
                    user_id,
                    assessment_id = %draft.assessment_id,
                    "user game score saved"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    user_id,
                    assessment_id = %draft.assessment_id,
                    error = %err,
                    "failed to save user game score"
                );
                Err(ServiceError::SaveScore(err))
            }
        }
    }

    /// Read a user's score for one assessment; `Ok(None)` when the user has
    /// no recorded score.
    pub async fn get_user_score(
        &self,
        user_id: &str,
        assessment_id: &str,
    ) -> Result<Option<ScoreEntity>, ServiceError> {
        require_id(user_id, "user ID")?;
        require_id(assessment_id, "assessment ID")?;

        let path = self.layout.score_document(user_id, assessment_id);
        match self.store.find(path.clone()).await {
            Ok(Some(document)) => Ok(Some(ScoreEntity::from_document(
                assessment_id.to_owned(),
                document,
            ))),
            Ok(None) => {
                debug!(path = %path, "user game score not found");
                Ok(None)
            }
            Err(err) => {
                error!(path = %path, error = %err, "failed to fetch user game score");
                Err(ServiceError::FetchScore(err))
            }
        }
    }
}

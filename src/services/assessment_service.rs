//! CRUD and approval toggling for generated game assessments.

use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as Json};
use tracing::{debug, error, info};

use crate::{
    config::CollectionLayout,
    dao::{
        document::{Document, FieldValue},
        document_store::{DocumentStore, ListQuery},
        models::{AssessmentEntity, fields},
    },
    error::ServiceError,
    services::validation::require_id,
};

/// Accessor for the per-module assessment subtree.
#[derive(Clone)]
pub struct AssessmentService {
    store: Arc<dyn DocumentStore>,
    layout: CollectionLayout,
}

impl AssessmentService {
    /// Build an accessor over `store` using the given collection layout.
    pub fn new(store: Arc<dyn DocumentStore>, layout: CollectionLayout) -> Self {
        Self { store, layout }
    }

    /// Persist a freshly generated assessment payload under its module.
    ///
    /// The accessor stamps `courseId`, `moduleId`, a server-assigned
    /// `generatedAt`, and `approvedByAdmin = false`; payload keys colliding
    /// with those are overwritten. Returns the store-assigned id.
    pub async fn save_generated_assessment(
        &self,
        course_id: &str,
        module_id: &str,
        payload: JsonMap<String, Json>,
    ) -> Result<String, ServiceError> {
        require_id(course_id, "course ID")?;
        require_id(module_id, "module ID")?;

        let mut document = Document::from_json_map(payload);
        document.set(fields::COURSE_ID, FieldValue::Text(course_id.to_owned()));
        document.set(fields::MODULE_ID, FieldValue::Text(module_id.to_owned()));
        document.set(fields::GENERATED_AT, FieldValue::ServerTimestamp);
        document.set(fields::APPROVED_BY_ADMIN, FieldValue::Boolean(false));

        let collection = self.layout.assessments_collection(course_id, module_id);
        match self.store.create(collection, document).await {
            Ok(id) => {
                info!(assessment_id = %id, course_id, module_id, "generated game assessment saved");
                Ok(id)
            }
            Err(err) => {
                error!(course_id, module_id, error = %err, "failed to save generated assessment");
                Err(ServiceError::SaveAssessment(err))
            }
        }
    }

    /// Read one assessment; `Ok(None)` when it does not exist.
    pub async fn get_assessment(
        &self,
        course_id: &str,
        module_id: &str,
        assessment_id: &str,
    ) -> Result<Option<AssessmentEntity>, ServiceError> {
        require_id(course_id, "course ID")?;
        require_id(module_id, "module ID")?;
        require_id(assessment_id, "assessment ID")?;

        let path = self
            .layout
            .assessment_document(course_id, module_id, assessment_id);
        match self.store.find(path.clone()).await {
            Ok(Some(document)) => Ok(Some(AssessmentEntity::from_document(
                assessment_id.to_owned(),
                document,
            ))),
            Ok(None) => {
                debug!(path = %path, "game assessment not found");
                Ok(None)
            }
            Err(err) => {
                error!(path = %path, error = %err, "failed to fetch game assessment");
                Err(ServiceError::FetchAssessment(err))
            }
        }
    }

    /// List a module's assessments, newest first by `generatedAt`.
    ///
    /// The student view (`include_unapproved = false`) filters on the
    /// approval flag, which is the query shape that needs the composite
    /// index on (`approvedByAdmin`, `generatedAt`); the admin view lists
    /// everything and only orders.
    pub async fn list_for_module(
        &self,
        course_id: &str,
        module_id: &str,
        include_unapproved: bool,
    ) -> Result<Vec<AssessmentEntity>, ServiceError> {
        require_id(course_id, "course ID")?;
        require_id(module_id, "module ID")?;

        let collection = self.layout.assessments_collection(course_id, module_id);
        let mut query = ListQuery::ordered_by(collection, fields::GENERATED_AT, true);
        if !include_unapproved {
            query = query.with_equality(fields::APPROVED_BY_ADMIN, FieldValue::Boolean(true));
        }

        match self.store.list(query).await {
            Ok(found) => Ok(found
                .into_iter()
                .map(|item| AssessmentEntity::from_document(item.id, item.document))
                .collect()),
            Err(err) => {
                error!(
                    course_id,
                    module_id,
                    include_unapproved,
                    error = %err,
                    "failed to fetch game assessments for module"
                );
                Err(ServiceError::ListAssessments(err))
            }
        }
    }

    /// Approve or unapprove an assessment. Only the approval flag is
    /// touched; repeating the same value is a no-op in effect.
    pub async fn set_approval(
        &self,
        course_id: &str,
        module_id: &str,
        assessment_id: &str,
        approved: bool,
    ) -> Result<(), ServiceError> {
        require_id(course_id, "course ID")?;
        require_id(module_id, "module ID")?;
        require_id(assessment_id, "assessment ID")?;

        let mut update = Document::new();
        update.set(fields::APPROVED_BY_ADMIN, FieldValue::Boolean(approved));

        let path = self
            .layout
            .assessment_document(course_id, module_id, assessment_id);
        match self.store.merge(path, update).await {
            Ok(()) => {
                info!(assessment_id, approved, "game assessment approval status updated");
                Ok(())
            }
            Err(err) => {
                error!(assessment_id, error = %err, "failed to update assessment approval status");
                Err(ServiceError::SetApproval(err))
            }
        }
    }

    /// Delete an assessment. Deleting one that does not exist succeeds;
    /// scores recorded against it are left in place.
    pub async fn delete_assessment(
        &self,
        course_id: &str,
        module_id: &str,
        assessment_id: &str,
    ) -> Result<(), ServiceError> {
        require_id(course_id, "course ID")?;
        require_id(module_id, "module ID")?;
        require_id(assessment_id, "assessment ID")?;

        let path = self
            .layout
            .assessment_document(course_id, module_id, assessment_id);
        match self.store.delete(path).await {
            Ok(()) => {
                info!(assessment_id, "game assessment deleted");
                Ok(())
            }
            Err(err) => {
                error!(assessment_id, error = %err, "failed to delete game assessment");
                Err(ServiceError::DeleteAssessment(err))
            }
        }
    }
}

//! Persisted entities shared across layers.
//!
//! Wire field names stay camelCase so the persisted layout is preserved
//! exactly; the structs expose them with the usual Rust naming. Timestamp
//! fields are resolved into the canonical textual form when an entity is
//! built from a stored document, so callers never see a raw or missing
//! timestamp.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as Json};

use crate::dao::document::{Document, FieldValue};
use crate::dao::timestamp::RawTimestamp;

/// Wire names of the fields the accessors manage themselves. Payload keys
/// colliding with these are overwritten on write and extracted on read.
pub mod fields {
    /// Course owning the module.
    pub const COURSE_ID: &str = "courseId";
    /// Module owning the assessment.
    pub const MODULE_ID: &str = "moduleId";
    /// Creation instant of the assessment, server-assigned.
    pub const GENERATED_AT: &str = "generatedAt";
    /// Admin approval gate; assessments start unapproved.
    pub const APPROVED_BY_ADMIN: &str = "approvedByAdmin";
    /// Owner of a score document.
    pub const USER_ID: &str = "userId";
    /// Assessment a score was recorded against.
    pub const ASSESSMENT_ID: &str = "assessmentId";
    /// Instant the score was recorded, server-assigned unless supplied.
    pub const COMPLETED_AT: &str = "completedAt";
}

/// A generated game assessment as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentEntity {
    /// Store-assigned document id.
    pub id: String,
    /// Course owning the module.
    pub course_id: String,
    /// Module the assessment belongs to.
    pub module_id: String,
    /// Canonical creation timestamp.
    pub generated_at: String,
    /// Whether an admin approved the assessment for student visibility.
    pub approved_by_admin: bool,
    /// Opaque generated content (questions, answers), passed through as-is.
    #[serde(flatten)]
    pub payload: JsonMap<String, Json>,
}

impl AssessmentEntity {
    /// Build an entity from a stored document, resolving `generatedAt` into
    /// its canonical form and leaving every unmanaged field in the payload.
    pub fn from_document(id: String, mut document: Document) -> Self {
        let generated_at =
            RawTimestamp::from_field(document.remove(fields::GENERATED_AT).as_ref())
                .resolve(fields::GENERATED_AT, &id);
        let approved_by_admin = matches!(
            document.remove(fields::APPROVED_BY_ADMIN),
            Some(FieldValue::Boolean(true))
        );
        let course_id = document.remove_text(fields::COURSE_ID).unwrap_or_default();
        let module_id = document.remove_text(fields::MODULE_ID).unwrap_or_default();

        Self {
            id,
            course_id,
            module_id,
            generated_at,
            approved_by_admin,
            payload: document.into_json_map(),
        }
    }
}

/// A per-user score against one assessment, keyed by the assessment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntity {
    /// Document id; always equal to `assessment_id`.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Assessment the score was recorded against.
    pub assessment_id: String,
    /// Course owning the module.
    pub course_id: String,
    /// Module the assessment belongs to.
    pub module_id: String,
    /// Canonical completion timestamp.
    pub completed_at: String,
    /// Opaque score and attempt details, passed through as-is.
    #[serde(flatten)]
    pub payload: JsonMap<String, Json>,
}

impl ScoreEntity {
    /// Build an entity from a stored document, resolving `completedAt` into
    /// its canonical form.
    pub fn from_document(id: String, mut document: Document) -> Self {
        let completed_at =
            RawTimestamp::from_field(document.remove(fields::COMPLETED_AT).as_ref())
                .resolve(fields::COMPLETED_AT, &id);
        let user_id = document.remove_text(fields::USER_ID).unwrap_or_default();
        let assessment_id = document
            .remove_text(fields::ASSESSMENT_ID)
            .unwrap_or_else(|| id.clone());
        let course_id = document.remove_text(fields::COURSE_ID).unwrap_or_default();
        let module_id = document.remove_text(fields::MODULE_ID).unwrap_or_default();

        Self {
            id,
            user_id,
            assessment_id,
            course_id,
            module_id,
            completed_at,
            payload: document.into_json_map(),
        }
    }
}

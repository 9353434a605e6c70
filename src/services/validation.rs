//! Identifier hygiene shared by both accessors.

use validator::ValidationError;

use crate::error::ServiceError;

/// Check one path identifier before it is spliced into a document address.
///
/// Empty identifiers are the classic caller bug the original service
/// guarded against; a `/` would silently address a different document, so
/// it is rejected for the same reason.
pub fn require_id(value: &str, name: &str) -> Result<(), ServiceError> {
    if value.is_empty() {
        return Err(ServiceError::InvalidArgument(format!("{name} is required")));
    }
    if value.contains('/') {
        return Err(ServiceError::InvalidArgument(format!(
            "{name} must not contain `/`"
        )));
    }
    Ok(())
}

/// Same rules, shaped for the `validator` derive on input structs.
pub fn validate_document_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        let mut err = ValidationError::new("document_id_empty");
        err.message = Some("identifier must not be empty".into());
        return Err(err);
    }
    if id.contains('/') {
        let mut err = ValidationError::new("document_id_separator");
        err.message = Some("identifier must not contain `/`".into());
        return Err(err);
    }
    Ok(())
}

//! Error types shared by the Firestore storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`FirestoreApiError`] failures.
pub type FirestoreResult<T> = Result<T, FirestoreApiError>;

/// gRPC status name Firestore reports when security rules deny a request.
const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
/// gRPC status name Firestore reports when a query precondition fails; a
/// missing composite index surfaces this way.
const FAILED_PRECONDITION: &str = "FAILED_PRECONDITION";

/// Failures that can occur while talking to the Firestore REST API.
#[derive(Debug, Error)]
pub enum FirestoreApiError {
    /// Required environment variable is missing.
    #[error("missing Firestore environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Firestore client")]
    ClientBuilder {
        /// Underlying client-construction failure.
        #[source]
        source: reqwest::Error,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send Firestore request to `{path}`")]
    RequestSend {
        /// Store-relative path the request targeted.
        path: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// Firestore answered with a non-success status code. When the response
    /// body carried the standard Google error payload, its status name and
    /// message are preserved here.
    #[error("unexpected Firestore response status {status} for `{path}`{}", display_detail(.grpc_status, .message))]
    RequestStatus {
        /// Store-relative path the request targeted.
        path: String,
        /// HTTP status code of the response.
        status: StatusCode,
        /// gRPC status name from the error body, e.g. `PERMISSION_DENIED`.
        grpc_status: Option<String>,
        /// Human-readable message from the error body.
        message: Option<String>,
    },
    /// Response payload could not be parsed into the expected wire model.
    #[error("failed to decode Firestore response for `{path}`")]
    DecodeResponse {
        /// Store-relative path the request targeted.
        path: String,
        /// Underlying decode failure.
        #[source]
        source: reqwest::Error,
    },
}

impl FirestoreApiError {
    /// Whether this failure means the store's security rules denied access.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            FirestoreApiError::RequestStatus {
                status,
                grpc_status,
                ..
            } => {
                *status == StatusCode::FORBIDDEN
                    || grpc_status.as_deref() == Some(PERMISSION_DENIED)
            }
            _ => false,
        }
    }

    /// Whether this failure means a filtered+ordered query ran without its
    /// composite index.
    pub fn is_missing_index(&self) -> bool {
        match self {
            FirestoreApiError::RequestStatus {
                grpc_status,
                message,
                ..
            } => {
                grpc_status.as_deref() == Some(FAILED_PRECONDITION)
                    && message
                        .as_deref()
                        .is_some_and(|text| text.to_ascii_lowercase().contains("index"))
            }
            _ => false,
        }
    }
}

fn display_detail(grpc_status: &Option<String>, message: &Option<String>) -> String {
    match (grpc_status, message) {
        (Some(status), Some(message)) => format!(" ({status}: {message})"),
        (Some(status), None) => format!(" ({status})"),
        (None, Some(message)) => format!(" ({message})"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(
        status: StatusCode,
        grpc_status: Option<&str>,
        message: Option<&str>,
    ) -> FirestoreApiError {
        FirestoreApiError::RequestStatus {
            path: "courses/c-1/modules/m-1/gameAssessments".into(),
            status,
            grpc_status: grpc_status.map(str::to_owned),
            message: message.map(str::to_owned),
        }
    }

    #[test]
    fn forbidden_counts_as_permission_denied_even_without_a_body() {
        assert!(status_error(StatusCode::FORBIDDEN, None, None).is_permission_denied());
    }

    #[test]
    fn grpc_status_name_counts_as_permission_denied() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            Some("PERMISSION_DENIED"),
            Some("Missing or insufficient permissions."),
        );
        assert!(err.is_permission_denied());
        assert!(!err.is_missing_index());
    }

    #[test]
    fn failed_precondition_mentioning_an_index_is_missing_index() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            Some("FAILED_PRECONDITION"),
            Some("The query requires an index. You can create it here: https://..."),
        );
        assert!(err.is_missing_index());
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn failed_precondition_without_index_talk_stays_generic() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            Some("FAILED_PRECONDITION"),
            Some("The referenced transaction has expired."),
        );
        assert!(!err.is_missing_index());
    }

    #[test]
    fn display_includes_the_google_status_detail() {
        let err = status_error(
            StatusCode::FORBIDDEN,
            Some("PERMISSION_DENIED"),
            Some("Missing or insufficient permissions."),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("403"));
        assert!(rendered.contains("PERMISSION_DENIED"));
        assert!(rendered.contains("Missing or insufficient permissions."));
    }
}

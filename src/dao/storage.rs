use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by storage backends regardless of the underlying database.
///
/// The two conditions a caller can act on (a filtered listing that needs a
/// composite index, and a security-rule denial) are separate variants so the
/// accessors can surface actionable messages; everything else is
/// [`StoreError::Unavailable`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused a filtered+ordered query because the composite
    /// index covering it does not exist yet.
    #[error(
        "the query needs a composite index on ({filter_field}, {order_field}); \
         create it in the store's console and retry"
    )]
    MissingIndex {
        /// Field the query filtered on.
        filter_field: String,
        /// Field the query ordered by.
        order_field: String,
        /// Backend failure that revealed the missing index.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The store's security rules denied access to the targeted documents.
    #[error("the store's security rules denied access")]
    PermissionDenied {
        /// Backend failure carrying the denial.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Any other backend failure (transport, decode, unexpected status).
    #[error("store request failed: {message}")]
    Unavailable {
        /// Rendering of the backend failure, kept on the variant so the
        /// caller-facing message survives even when the chain is not walked.
        message: String,
        /// The backend failure itself.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StoreError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StoreError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a permission-denied error from a backend failure.
    pub fn permission_denied(source: impl Error + Send + Sync + 'static) -> Self {
        StoreError::PermissionDenied {
            source: Box::new(source),
        }
    }
}

//! Abstraction over the hierarchical document store.

#[cfg(feature = "firestore-store")]
pub mod firestore;
#[cfg(feature = "memory-store")]
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::document::{Document, FieldValue};
use crate::dao::paths::{CollectionPath, DocumentPath};
use crate::dao::storage::StoreResult;

/// A document returned by a collection listing, paired with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundDocument {
    /// The id of the document inside its collection.
    pub id: String,
    /// The document's fields.
    pub document: Document,
}

/// A collection listing: single-field ordering plus an optional equality
/// filter. The filtered+ordered shape is the one that needs a composite
/// index server-side; see [`crate::dao::storage::StoreError::MissingIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Collection to list; only direct children are returned, never
    /// documents of nested subcollections.
    pub collection: CollectionPath,
    /// Optional `field == value` filter on a top-level field.
    pub filter: Option<(String, FieldValue)>,
    /// Top-level field the results are ordered by; documents missing the
    /// field are excluded, per the store's ordering semantics.
    pub order_field: String,
    /// Whether ordering is descending.
    pub descending: bool,
}

impl ListQuery {
    /// An unfiltered listing ordered by `order_field`.
    pub fn ordered_by(
        collection: CollectionPath,
        order_field: impl Into<String>,
        descending: bool,
    ) -> Self {
        Self {
            collection,
            filter: None,
            order_field: order_field.into(),
            descending,
        }
    }

    /// Restrict the listing to documents where `field == value`.
    pub fn with_equality(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.filter = Some((field.into(), value));
        self
    }
}

/// Abstraction over the persistence layer for assessment and score documents.
///
/// Every operation is a single-shot call; absence on reads is `Ok(None)`,
/// deletes are idempotent, and merges upsert (a merge against a missing
/// document creates it). Backends resolve the
/// [`FieldValue::ServerTimestamp`] sentinel with their own clock at write
/// time.
pub trait DocumentStore: Send + Sync {
    /// Add a document to `collection`, letting the store assign its id.
    /// Returns the assigned id.
    fn create(
        &self,
        collection: CollectionPath,
        document: Document,
    ) -> BoxFuture<'static, StoreResult<String>>;

    /// Read a single document; `Ok(None)` when it does not exist.
    fn find(&self, path: DocumentPath) -> BoxFuture<'static, StoreResult<Option<Document>>>;

    /// List a collection's direct children per the query's filter and order.
    fn list(&self, query: ListQuery) -> BoxFuture<'static, StoreResult<Vec<FoundDocument>>>;

    /// Merge-write `fields` into the document at `path`, creating it when
    /// absent. Fields not named by `fields` are left untouched.
    fn merge(
        &self,
        path: DocumentPath,
        fields: Document,
    ) -> BoxFuture<'static, StoreResult<()>>;

    /// Delete the document at `path`; deleting a missing document succeeds.
    fn delete(&self, path: DocumentPath) -> BoxFuture<'static, StoreResult<()>>;
}

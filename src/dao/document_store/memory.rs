//! In-process document store with the same observable semantics as the
//! managed backend: merge-writes upsert, deletes are idempotent, listings
//! return direct children only, and server-timestamp sentinels resolve to
//! the local clock at write time. Used by the test suite and by embedders
//! that want a hermetic store.

use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::dao::{
    document::{Document, FieldValue, auto_id},
    document_store::{DocumentStore, FoundDocument, ListQuery},
    paths::{CollectionPath, DocumentPath},
    storage::StoreResult,
};

/// Document store keyed by full document path in a concurrent map.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<DashMap<String, Document>>,
}

impl MemoryDocumentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held, across all collections.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents at all.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Replace server-timestamp sentinels with the local clock, recursing into
/// nested maps and arrays.
fn resolve_sentinels(value: &mut FieldValue, now: OffsetDateTime) {
    match value {
        FieldValue::ServerTimestamp => *value = FieldValue::Timestamp(now),
        FieldValue::Array(items) => {
            for item in items {
                resolve_sentinels(item, now);
            }
        }
        FieldValue::Map(entries) => {
            for entry in entries.values_mut() {
                resolve_sentinels(entry, now);
            }
        }
        _ => {}
    }
}

fn resolve_document(document: &mut Document) {
    let now = OffsetDateTime::now_utc();
    let resolved: Document = std::mem::take(document)
        .into_iter()
        .map(|(field, mut value)| {
            resolve_sentinels(&mut value, now);
            (field, value)
        })
        .collect();
    *document = resolved;
}

/// The store's cross-type sort order: null < bool < number < timestamp <
/// string, with composite values ranked after scalars and compared only by
/// rank.
fn type_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Null => 0,
        FieldValue::Boolean(_) => 1,
        FieldValue::Integer(_) | FieldValue::Double(_) => 2,
        FieldValue::Timestamp(_) => 3,
        FieldValue::Text(_) => 4,
        FieldValue::Array(_) => 5,
        FieldValue::Map(_) => 6,
        FieldValue::ServerTimestamp => 7,
    }
}

fn compare_values(left: &FieldValue, right: &FieldValue) -> Ordering {
    let by_rank = type_rank(left).cmp(&type_rank(right));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    match (left, right) {
        (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
        (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
        (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
        (a, b) => {
            // Mixed integer/double comparison happens through f64.
            let (a, b) = (as_f64(a), as_f64(b));
            match (a, b) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
    }
}

fn as_f64(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Integer(integer) => Some(*integer as f64),
        FieldValue::Double(double) => Some(*double),
        _ => None,
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create(
        &self,
        collection: CollectionPath,
        mut document: Document,
    ) -> BoxFuture<'static, StoreResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let id = auto_id();
            resolve_document(&mut document);
            store
                .documents
                .insert(collection.document(&id).as_str().to_owned(), document);
            Ok(id)
        })
    }

    fn find(&self, path: DocumentPath) -> BoxFuture<'static, StoreResult<Option<Document>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .documents
                .get(path.as_str())
                .map(|entry| entry.value().clone()))
        })
    }

    fn list(&self, query: ListQuery) -> BoxFuture<'static, StoreResult<Vec<FoundDocument>>> {
        let store = self.clone();
        Box::pin(async move {
            let prefix = format!("{}/", query.collection);
            let mut matched: Vec<(FieldValue, FoundDocument)> = store
                .documents
                .iter()
                .filter_map(|entry| {
                    let id = entry.key().strip_prefix(&prefix)?;
                    // Direct children only: a remaining `/` means the key
                    // addresses a document in a nested subcollection.
                    if id.contains('/') {
                        return None;
                    }
                    let document = entry.value().clone();
                    if let Some((field, expected)) = query.filter.as_ref() {
                        if document.get(field) != Some(expected) {
                            return None;
                        }
                    }
                    // Documents missing the order field are excluded, as the
                    // managed store does.
                    let order_key = document.get(&query.order_field)?.clone();
                    Some((
                        order_key,
                        FoundDocument {
                            id: id.to_owned(),
                            document,
                        },
                    ))
                })
                .collect();

            matched.sort_by(|(a, _), (b, _)| {
                let ordering = compare_values(a, b);
                if query.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });

            Ok(matched.into_iter().map(|(_, found)| found).collect())
        })
    }

    fn merge(
        &self,
        path: DocumentPath,
        mut fields: Document,
    ) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            resolve_document(&mut fields);
            store
                .documents
                .entry(path.as_str().to_owned())
                .or_default()
                .merge_from(fields);
            Ok(())
        })
    }

    fn delete(&self, path: DocumentPath) -> BoxFuture<'static, StoreResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.documents.remove(path.as_str());
            Ok(())
        })
    }
}

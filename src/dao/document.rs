//! Store-neutral document representation.
//!
//! Backends exchange documents as an ordered field map over [`FieldValue`],
//! the value union of the hierarchical store. JSON enters and leaves the
//! crate at this boundary: opaque payloads come in as `serde_json` maps and
//! persisted documents go back out the same way.

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::dao::timestamp::canonical;

/// Length of the identifiers the store assigns to new documents.
const AUTO_ID_LENGTH: usize = 20;
/// Alphabet the official client SDKs draw auto-ids from.
const AUTO_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A single field value inside a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Double(f64),
    /// UTF-8 text.
    Text(String),
    /// A native timestamp of the store.
    Timestamp(time::OffsetDateTime),
    /// Ordered list of values.
    Array(Vec<FieldValue>),
    /// Nested map of values, insertion-ordered.
    Map(IndexMap<String, FieldValue>),
    /// Write-only sentinel replaced with the store's clock when the write is
    /// applied. Never present in a document read back from a backend, and
    /// only supported at the top level of a document.
    ServerTimestamp,
}

impl FieldValue {
    /// Convert a JSON value. Numbers become [`FieldValue::Integer`] when the
    /// JSON number is an exact integer, [`FieldValue::Double`] otherwise;
    /// strings stay text (timestamp classification happens at read time, see
    /// `dao::timestamp`).
    pub fn from_json(value: Json) -> Self {
        match value {
            Json::Null => FieldValue::Null,
            Json::Bool(flag) => FieldValue::Boolean(flag),
            Json::Number(number) => match number.as_i64() {
                Some(integer) => FieldValue::Integer(integer),
                None => FieldValue::Double(number.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(text) => FieldValue::Text(text),
            Json::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from_json).collect())
            }
            Json::Object(entries) => FieldValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, FieldValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON. Timestamps render in the canonical textual form;
    /// the write-only sentinel degrades to null (it never survives a read, so
    /// this only matters for documents that were never persisted).
    pub fn into_json(self) -> Json {
        match self {
            FieldValue::Null | FieldValue::ServerTimestamp => Json::Null,
            FieldValue::Boolean(flag) => Json::Bool(flag),
            FieldValue::Integer(integer) => Json::Number(integer.into()),
            FieldValue::Double(double) => Number::from_f64(double)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            FieldValue::Text(text) => Json::String(text),
            FieldValue::Timestamp(instant) => Json::String(canonical(instant)),
            FieldValue::Array(items) => {
                Json::Array(items.into_iter().map(FieldValue::into_json).collect())
            }
            FieldValue::Map(entries) => Json::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into_json()))
                    .collect(),
            ),
        }
    }
}

/// An insertion-ordered set of named fields, the unit every store operation
/// reads or writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: IndexMap<String, FieldValue>,
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from an opaque JSON payload.
    pub fn from_json_map(payload: JsonMap<String, Json>) -> Self {
        Self {
            fields: payload
                .into_iter()
                .map(|(key, value)| (key, FieldValue::from_json(value)))
                .collect(),
        }
    }

    /// Consume the document into a JSON object.
    pub fn into_json_map(self) -> JsonMap<String, Json> {
        self.fields
            .into_iter()
            .map(|(key, value)| (key, value.into_json()))
            .collect()
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) -> &mut Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Remove a field, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    /// Remove a field expected to hold text; non-text values are dropped.
    pub fn remove_text(&mut self, name: &str) -> Option<String> {
        match self.remove(name) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// Apply `incoming` with merge-write semantics: maps merge recursively,
    /// every other value kind replaces whatever was there before.
    pub fn merge_from(&mut self, incoming: Document) {
        for (name, value) in incoming.fields {
            merge_value(&mut self.fields, name, value);
        }
    }
}

fn merge_value(target: &mut IndexMap<String, FieldValue>, name: String, incoming: FieldValue) {
    match (target.get_mut(&name), incoming) {
        (Some(FieldValue::Map(existing)), FieldValue::Map(update)) => {
            for (key, value) in update {
                merge_value(existing, key, value);
            }
        }
        (_, incoming) => {
            target.insert(name, incoming);
        }
    }
}

impl FromIterator<(String, FieldValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Generate a store-style document identifier: 20 characters drawn from the
/// same alphabet the official SDKs use when the caller lets the store pick
/// the id.
pub fn auto_id() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    (0..AUTO_ID_LENGTH)
        .map(|_| AUTO_ID_ALPHABET[rng.random_range(0..AUTO_ID_ALPHABET.len())] as char)
        .collect()
}

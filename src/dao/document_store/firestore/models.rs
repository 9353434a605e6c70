//! Wire models for the Firestore REST v1 surface: the typed value union,
//! documents, `commit` writes, `runQuery` requests, and the standard Google
//! error body.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use time::format_description::well_known::Rfc3339;

use crate::dao::document::{Document, FieldValue};
use crate::dao::timestamp::canonical;

/// Transform name that makes the server stamp a field with its own clock.
pub const SERVER_VALUE_REQUEST_TIME: &str = "REQUEST_TIME";
/// Wire name of the descending sort direction.
pub const DIRECTION_DESCENDING: &str = "DESCENDING";
/// Wire name of the ascending sort direction.
pub const DIRECTION_ASCENDING: &str = "ASCENDING";
/// Wire name of the equality filter operator.
pub const OP_EQUAL: &str = "EQUAL";

/// The REST encoding of a single field value.
///
/// `integerValue` travels as a decimal string per the REST mapping of
/// 64-bit integers; `timestampValue` travels as RFC 3339 text. Value kinds
/// this layout never uses (bytes, geopoints, references) are not modeled,
/// so a document carrying one fails the decode with a typed error instead
/// of being silently reshaped.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    /// Explicit null.
    NullValue(()),
    /// Boolean.
    BooleanValue(bool),
    /// 64-bit integer, encoded as a decimal string.
    IntegerValue(#[serde_as(as = "DisplayFromStr")] i64),
    /// Double-precision float.
    DoubleValue(f64),
    /// Timestamp as RFC 3339 text.
    TimestampValue(String),
    /// UTF-8 text.
    StringValue(String),
    /// Ordered list of values.
    ArrayValue(WireArrayValue),
    /// Nested map of values.
    MapValue(WireMapValue),
}

/// Wrapper object the wire format uses around array items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireArrayValue {
    /// The array items; Firestore omits the key entirely for empty arrays.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<WireValue>,
}

/// Wrapper object the wire format uses around nested maps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireMapValue {
    /// The map entries; Firestore omits the key entirely for empty maps.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, WireValue>,
}

impl WireValue {
    /// Encode a document field for the wire. Returns `None` for the
    /// write-only server-timestamp sentinel, which travels as a field
    /// transform instead of a value (see [`WireFieldTransform`]).
    pub fn encode(value: &FieldValue) -> Option<Self> {
        Some(match value {
            FieldValue::Null => WireValue::NullValue(()),
            FieldValue::Boolean(flag) => WireValue::BooleanValue(*flag),
            FieldValue::Integer(integer) => WireValue::IntegerValue(*integer),
            FieldValue::Double(double) => WireValue::DoubleValue(*double),
            FieldValue::Text(text) => WireValue::StringValue(text.clone()),
            FieldValue::Timestamp(instant) => WireValue::TimestampValue(canonical(*instant)),
            FieldValue::Array(items) => WireValue::ArrayValue(WireArrayValue {
                values: items.iter().filter_map(WireValue::encode).collect(),
            }),
            FieldValue::Map(entries) => WireValue::MapValue(WireMapValue {
                fields: entries
                    .iter()
                    .filter_map(|(key, value)| {
                        WireValue::encode(value).map(|wire| (key.clone(), wire))
                    })
                    .collect(),
            }),
            FieldValue::ServerTimestamp => return None,
        })
    }

    /// Decode a wire value into the document field union. A `timestampValue`
    /// the server somehow returns malformed degrades to text; readers
    /// resolve text timestamps leniently at the read boundary.
    pub fn decode(self) -> FieldValue {
        match self {
            WireValue::NullValue(()) => FieldValue::Null,
            WireValue::BooleanValue(flag) => FieldValue::Boolean(flag),
            WireValue::IntegerValue(integer) => FieldValue::Integer(integer),
            WireValue::DoubleValue(double) => FieldValue::Double(double),
            WireValue::TimestampValue(text) => {
                match time::OffsetDateTime::parse(&text, &Rfc3339) {
                    Ok(instant) => FieldValue::Timestamp(instant),
                    Err(_) => FieldValue::Text(text),
                }
            }
            WireValue::StringValue(text) => FieldValue::Text(text),
            WireValue::ArrayValue(array) => {
                FieldValue::Array(array.values.into_iter().map(WireValue::decode).collect())
            }
            WireValue::MapValue(map) => FieldValue::Map(
                map.fields
                    .into_iter()
                    .map(|(key, value)| (key, value.decode()))
                    .collect(),
            ),
        }
    }
}

/// A document as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    /// Full resource name,
    /// `projects/{p}/databases/{d}/documents/{document path}`.
    pub name: String,
    /// The document's fields; omitted entirely for empty documents.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, WireValue>,
    /// Server-assigned creation time, never sent on writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Server-assigned update time, never sent on writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl WireDocument {
    /// Encode a document for a write targeting `name`. Server-timestamp
    /// sentinels are split out as transforms rather than values.
    pub fn encode(name: String, document: &Document) -> (Self, Vec<WireFieldTransform>) {
        let mut fields = IndexMap::new();
        let mut transforms = Vec::new();
        for (field, value) in document.iter() {
            match WireValue::encode(value) {
                Some(wire) => {
                    fields.insert(field.clone(), wire);
                }
                None => transforms.push(WireFieldTransform::request_time(field.clone())),
            }
        }
        (
            Self {
                name,
                fields,
                create_time: None,
                update_time: None,
            },
            transforms,
        )
    }

    /// Decode the wire fields into a document, dropping the resource name.
    pub fn decode(self) -> Document {
        self.fields
            .into_iter()
            .map(|(field, value)| (field, value.decode()))
            .collect()
    }

    /// The document id: the final segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Body of a `documents:commit` request.
#[derive(Debug, Serialize)]
pub struct CommitRequest {
    /// The writes applied atomically, in order.
    pub writes: Vec<WireWrite>,
}

/// One write inside a commit: either an `update` (optionally masked, with
/// field transforms) or a `delete`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireWrite {
    /// Document content to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<WireDocument>,
    /// Resource name of a document to delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    /// When present, only the named field paths are written; fields of the
    /// existing document outside the mask are left untouched (merge
    /// semantics). Absent means a full replace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<WireDocumentMask>,
    /// Server-side transforms applied after the update; carries the
    /// server-timestamp stamps.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub update_transforms: Vec<WireFieldTransform>,
}

impl WireWrite {
    /// A full-replace write (document creation).
    pub fn set(update: WireDocument, transforms: Vec<WireFieldTransform>) -> Self {
        Self {
            update: Some(update),
            delete: None,
            update_mask: None,
            update_transforms: transforms,
        }
    }

    /// A merge write: only the fields present on `update` (plus the
    /// transforms) are touched. The mask lists exactly the non-transform
    /// fields, so transform-only fields never appear in it.
    pub fn merge(update: WireDocument, transforms: Vec<WireFieldTransform>) -> Self {
        let field_paths = update.fields.keys().cloned().collect();
        Self {
            update: Some(update),
            delete: None,
            update_mask: Some(WireDocumentMask { field_paths }),
            update_transforms: transforms,
        }
    }

    /// A delete write.
    pub fn delete(name: String) -> Self {
        Self {
            update: None,
            delete: Some(name),
            update_mask: None,
            update_transforms: Vec::new(),
        }
    }
}

/// Set of field paths a masked write touches.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocumentMask {
    /// The touched field paths.
    pub field_paths: Vec<String>,
}

/// A server-side field transform.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFieldTransform {
    /// Field path the transform writes.
    pub field_path: String,
    /// Server value to set; this crate only uses `REQUEST_TIME`.
    pub set_to_server_value: &'static str,
}

impl WireFieldTransform {
    /// Stamp `field_path` with the server's clock at write time.
    pub fn request_time(field_path: String) -> Self {
        Self {
            field_path,
            set_to_server_value: SERVER_VALUE_REQUEST_TIME,
        }
    }
}

/// Body of a `documents:runQuery` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    /// The query to run under the request's parent document.
    pub structured_query: StructuredQuery,
}

/// The structured-query shape this crate emits: one collection selector, an
/// optional equality filter, and a single order-by.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    /// Collections to query; always exactly one here.
    pub from: Vec<CollectionSelector>,
    /// Optional filter.
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<WireFilter>,
    /// Result ordering.
    pub order_by: Vec<WireOrder>,
}

/// Selects a collection by its id under the query parent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    /// Final path segment of the collection.
    pub collection_id: String,
}

/// Filter tree; only single field filters are emitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WireFilter {
    /// A `field op value` comparison.
    FieldFilter(WireFieldFilter),
}

impl WireFilter {
    /// An equality comparison on a top-level field.
    pub fn equality(field_path: String, value: WireValue) -> Self {
        WireFilter::FieldFilter(WireFieldFilter {
            field: WireFieldReference { field_path },
            op: OP_EQUAL,
            value,
        })
    }
}

/// A single-field comparison.
#[derive(Debug, Serialize)]
pub struct WireFieldFilter {
    /// Field being compared.
    pub field: WireFieldReference,
    /// Comparison operator; this crate only emits `EQUAL`.
    pub op: &'static str,
    /// Right-hand operand.
    pub value: WireValue,
}

/// Reference to a field by path.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFieldReference {
    /// Dotted field path.
    pub field_path: String,
}

/// One ordering clause.
#[derive(Debug, Serialize)]
pub struct WireOrder {
    /// Field ordered by.
    pub field: WireFieldReference,
    /// `ASCENDING` or `DESCENDING`.
    pub direction: &'static str,
}

impl WireOrder {
    /// Order by a top-level field.
    pub fn by(field_path: String, descending: bool) -> Self {
        Self {
            field: WireFieldReference { field_path },
            direction: if descending {
                DIRECTION_DESCENDING
            } else {
                DIRECTION_ASCENDING
            },
        }
    }
}

/// One element of the streamed `runQuery` response array. Elements without
/// a `document` key (progress markers, the final read time) are skipped.
#[derive(Debug, Deserialize)]
pub struct RunQueryResponseItem {
    /// The matched document, when this element carries one.
    #[serde(default)]
    pub document: Option<WireDocument>,
}

/// The standard Google error envelope.
#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    /// The error payload.
    pub error: GoogleStatus,
}

/// The standard Google error payload.
#[derive(Debug, Deserialize)]
pub struct GoogleStatus {
    /// Numeric code matching the HTTP status.
    #[serde(default)]
    pub code: i64,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
    /// gRPC status name, e.g. `PERMISSION_DENIED`.
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn integer_values_travel_as_decimal_strings() {
        let wire = WireValue::encode(&FieldValue::Integer(42)).expect("encodes");
        assert_eq!(
            serde_json::to_value(&wire).expect("serializes"),
            json!({"integerValue": "42"})
        );

        let decoded: WireValue =
            serde_json::from_value(json!({"integerValue": "-7"})).expect("deserializes");
        assert_eq!(decoded.decode(), FieldValue::Integer(-7));
    }

    #[test]
    fn null_and_nested_map_values_keep_their_wire_shape() {
        let mut entries = IndexMap::new();
        entries.insert("difficulty".to_owned(), FieldValue::Text("easy".into()));
        entries.insert("retired".to_owned(), FieldValue::Null);
        let wire = WireValue::encode(&FieldValue::Map(entries)).expect("encodes");

        assert_eq!(
            serde_json::to_value(&wire).expect("serializes"),
            json!({"mapValue": {"fields": {
                "difficulty": {"stringValue": "easy"},
                "retired": {"nullValue": null},
            }}})
        );
    }

    #[test]
    fn timestamps_encode_as_rfc3339_and_decode_back() {
        let instant = datetime!(2024-01-01 0:00 UTC);
        let wire = WireValue::encode(&FieldValue::Timestamp(instant)).expect("encodes");
        assert_eq!(
            serde_json::to_value(&wire).expect("serializes"),
            json!({"timestampValue": "2024-01-01T00:00:00.000Z"})
        );
        assert_eq!(wire.decode(), FieldValue::Timestamp(instant));
    }

    #[test]
    fn malformed_timestamp_value_degrades_to_text() {
        let decoded: WireValue =
            serde_json::from_value(json!({"timestampValue": "not-a-date"})).expect("deserializes");
        assert_eq!(decoded.decode(), FieldValue::Text("not-a-date".into()));
    }

    #[test]
    fn unknown_value_kinds_fail_the_decode() {
        let result: Result<WireValue, _> =
            serde_json::from_value(json!({"bytesValue": "AAEC"}));
        assert!(result.is_err());
    }

    #[test]
    fn create_write_splits_sentinels_into_transforms_without_a_mask() {
        let mut document = Document::new();
        document.set("courseId", FieldValue::Text("c-1".into()));
        document.set("generatedAt", FieldValue::ServerTimestamp);
        document.set("approvedByAdmin", FieldValue::Boolean(false));

        let (wire, transforms) = WireDocument::encode("projects/p/databases/(default)/documents/courses/c-1/modules/m-1/gameAssessments/abc".into(), &document);
        let write = WireWrite::set(wire, transforms);

        assert_eq!(
            serde_json::to_value(&write).expect("serializes"),
            json!({
                "update": {
                    "name": "projects/p/databases/(default)/documents/courses/c-1/modules/m-1/gameAssessments/abc",
                    "fields": {
                        "courseId": {"stringValue": "c-1"},
                        "approvedByAdmin": {"booleanValue": false},
                    },
                },
                "updateTransforms": [
                    {"fieldPath": "generatedAt", "setToServerValue": "REQUEST_TIME"},
                ],
            })
        );
    }

    #[test]
    fn merge_write_masks_only_the_non_transform_fields() {
        let mut document = Document::new();
        document.set("approvedByAdmin", FieldValue::Boolean(true));
        document.set("completedAt", FieldValue::ServerTimestamp);

        let (wire, transforms) = WireDocument::encode("n".into(), &document);
        let write = WireWrite::merge(wire, transforms);
        let rendered = serde_json::to_value(&write).expect("serializes");

        assert_eq!(
            rendered["updateMask"],
            json!({"fieldPaths": ["approvedByAdmin"]})
        );
        assert_eq!(
            rendered["updateTransforms"],
            json!([{"fieldPath": "completedAt", "setToServerValue": "REQUEST_TIME"}])
        );
    }

    #[test]
    fn structured_query_renders_the_documented_shape() {
        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: "gameAssessments".into(),
                }],
                filter: Some(WireFilter::equality(
                    "approvedByAdmin".into(),
                    WireValue::BooleanValue(true),
                )),
                order_by: vec![WireOrder::by("generatedAt".into(), true)],
            },
        };

        assert_eq!(
            serde_json::to_value(&request).expect("serializes"),
            json!({
                "structuredQuery": {
                    "from": [{"collectionId": "gameAssessments"}],
                    "where": {"fieldFilter": {
                        "field": {"fieldPath": "approvedByAdmin"},
                        "op": "EQUAL",
                        "value": {"booleanValue": true},
                    }},
                    "orderBy": [{
                        "field": {"fieldPath": "generatedAt"},
                        "direction": "DESCENDING",
                    }],
                }
            })
        );
    }

    #[test]
    fn google_error_body_parses() {
        let body: GoogleErrorBody = serde_json::from_value(json!({
            "error": {
                "code": 403,
                "message": "Missing or insufficient permissions.",
                "status": "PERMISSION_DENIED",
            }
        }))
        .expect("parses");
        assert_eq!(body.error.code, 403);
        assert_eq!(body.error.status.as_deref(), Some("PERMISSION_DENIED"));
    }
}

//! Timestamp resolution at the store-read boundary.
//!
//! Persisted documents carry timestamps in several shapes: the store's own
//! timestamp values, strings written by earlier clients, or nothing at all
//! when a document was hand-edited or produced by a buggy writer. Readers
//! classify the raw field once into [`RawTimestamp`] and resolve it into the
//! canonical textual form; resolution is total, so a corrupt timestamp never
//! blocks the rest of the record.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::warn;

use crate::dao::document::FieldValue;

/// Canonical rendering of the Unix epoch, the fallback for anything that
/// cannot be resolved.
pub const EPOCH_TEXT: &str = "1970-01-01T00:00:00.000Z";

/// A timestamp field as read from a document, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// The store returned a native timestamp value.
    Native(OffsetDateTime),
    /// The field holds text that may or may not parse as an instant.
    Text(String),
    /// The field is absent or holds a non-timestamp value.
    Unknown,
}

impl RawTimestamp {
    /// Classify an optional document field.
    pub fn from_field(value: Option<&FieldValue>) -> Self {
        match value {
            Some(FieldValue::Timestamp(instant)) => RawTimestamp::Native(*instant),
            Some(FieldValue::Text(text)) => RawTimestamp::Text(text.clone()),
            _ => RawTimestamp::Unknown,
        }
    }

    /// Resolve into the canonical `YYYY-MM-DDTHH:MM:SS.mmmZ` form.
    ///
    /// Unparseable or missing values fall back to [`EPOCH_TEXT`]; the anomaly
    /// is logged with the owning document so it can be traced, not raised.
    pub fn resolve(self, field: &str, document_id: &str) -> String {
        match self {
            RawTimestamp::Native(instant) => canonical(instant),
            RawTimestamp::Text(text) => match parse_instant(&text) {
                Some(instant) => canonical(instant),
                None => {
                    warn!(
                        document_id,
                        field,
                        raw = %text,
                        "unparseable timestamp string; falling back to the epoch"
                    );
                    EPOCH_TEXT.to_owned()
                }
            },
            RawTimestamp::Unknown => {
                warn!(
                    document_id,
                    field, "missing or non-timestamp value; falling back to the epoch"
                );
                EPOCH_TEXT.to_owned()
            }
        }
    }
}

/// Format an instant as UTC with exactly three subsecond digits.
pub fn canonical(instant: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    instant
        .to_offset(UtcOffset::UTC)
        .format(format)
        .unwrap_or_else(|_| EPOCH_TEXT.to_owned())
}

/// Parse the instant shapes found in existing documents: RFC 3339, an
/// offset-less date-time (taken as UTC), or a bare date (midnight UTC).
pub fn parse_instant(text: &str) -> Option<OffsetDateTime> {
    if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(instant);
    }

    let fractional = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
    );
    if let Ok(local) = PrimitiveDateTime::parse(text, fractional) {
        return Some(local.assume_utc());
    }

    let whole = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(local) = PrimitiveDateTime::parse(text, whole) {
        return Some(local.assume_utc());
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(text, date_only) {
        return Some(date.midnight().assume_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn native_timestamp_formats_with_millisecond_precision() {
        let raw = RawTimestamp::Native(datetime!(2024-01-01 0:00 UTC));
        assert_eq!(raw.resolve("generatedAt", "a-1"), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn native_timestamp_truncates_to_three_subsecond_digits() {
        let raw = RawTimestamp::Native(datetime!(2024-05-06 07:08:09.123456789 UTC));
        assert_eq!(raw.resolve("generatedAt", "a-1"), "2024-05-06T07:08:09.123Z");
    }

    #[test]
    fn native_timestamp_is_renormalized_to_utc() {
        let raw = RawTimestamp::Native(datetime!(2024-01-01 10:30 +2));
        assert_eq!(raw.resolve("generatedAt", "a-1"), "2024-01-01T08:30:00.000Z");
    }

    #[test]
    fn unparseable_text_falls_back_to_the_epoch() {
        let raw = RawTimestamp::Text("not-a-date".into());
        assert_eq!(raw.resolve("generatedAt", "a-1"), EPOCH_TEXT);
    }

    #[test]
    fn absent_field_falls_back_to_the_epoch() {
        let raw = RawTimestamp::from_field(None);
        assert_eq!(raw, RawTimestamp::Unknown);
        assert_eq!(raw.resolve("generatedAt", "a-1"), EPOCH_TEXT);
    }

    #[test]
    fn non_timestamp_field_falls_back_to_the_epoch() {
        let raw = RawTimestamp::from_field(Some(&FieldValue::Boolean(true)));
        assert_eq!(raw.resolve("generatedAt", "a-1"), EPOCH_TEXT);
    }

    #[test]
    fn rfc3339_text_with_offset_is_renormalized() {
        let raw = RawTimestamp::Text("2024-01-01T10:30:00+02:00".into());
        assert_eq!(raw.resolve("generatedAt", "a-1"), "2024-01-01T08:30:00.000Z");
    }

    #[test]
    fn offsetless_text_is_taken_as_utc() {
        assert_eq!(
            RawTimestamp::Text("2024-03-05T10:00:00".into()).resolve("generatedAt", "a-1"),
            "2024-03-05T10:00:00.000Z"
        );
        assert_eq!(
            RawTimestamp::Text("2024-03-05T10:00:00.5".into()).resolve("generatedAt", "a-1"),
            "2024-03-05T10:00:00.500Z"
        );
    }

    #[test]
    fn bare_date_resolves_to_midnight_utc() {
        let raw = RawTimestamp::Text("2024-03-05".into());
        assert_eq!(raw.resolve("generatedAt", "a-1"), "2024-03-05T00:00:00.000Z");
    }

    #[test]
    fn canonical_output_reparses_as_rfc3339() {
        let rendered = canonical(datetime!(2023-11-12 13:14:15.678 UTC));
        let reparsed = OffsetDateTime::parse(&rendered, &Rfc3339).expect("canonical parses");
        assert_eq!(reparsed, datetime!(2023-11-12 13:14:15.678 UTC));
    }
}

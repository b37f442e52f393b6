//! Opaque cursor encoding.
//!
//! A cursor travels as base64url (no padding) over a compact JSON array of its key
//! values: integers as numbers, text as strings, timestamps as RFC 3339 strings
//! with full sub-second precision. The alphabet is safe in a URL query parameter.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use super::{Cursor, KeyKind, KeyValue, PaginationError, SortKey, SortSpec};

pub fn encode(cursor: &Cursor) -> String {
    let values: Vec<JsonValue> = cursor.values().iter().map(to_json).collect();
    URL_SAFE_NO_PAD.encode(JsonValue::Array(values).to_string())
}

/// Decode a cursor for `sort`. Fails on bad base64, bad JSON, wrong arity, or a
/// value that does not match its key's kind.
pub fn decode(token: &str, sort: &SortSpec) -> Result<Cursor, PaginationError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| PaginationError::MalformedCursor("not valid base64url".into()))?;
    let values: Vec<JsonValue> = serde_json::from_slice(&bytes)
        .map_err(|_| PaginationError::MalformedCursor("not a JSON array".into()))?;

    if values.len() != sort.arity() {
        return Err(PaginationError::MalformedCursor(format!(
            "expected {} values, found {}",
            sort.arity(),
            values.len()
        )));
    }

    let values = sort
        .key_columns()
        .into_iter()
        .zip(values.iter())
        .map(|(key, value)| from_json(key, value))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Cursor::from_values(values))
}

fn to_json(value: &KeyValue) -> JsonValue {
    match value {
        KeyValue::Text(s) => JsonValue::String(s.clone()),
        KeyValue::Integer(n) => JsonValue::Number((*n).into()),
        KeyValue::Timestamp(t) => JsonValue::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    }
}

fn from_json(key: &SortKey, value: &JsonValue) -> Result<KeyValue, PaginationError> {
    let parsed = match (key.kind, value) {
        (KeyKind::Text, JsonValue::String(s)) => Some(KeyValue::Text(s.clone())),
        (KeyKind::Integer, JsonValue::Number(n)) => n.as_i64().map(KeyValue::Integer),
        (KeyKind::Timestamp, JsonValue::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| KeyValue::Timestamp(t.with_timezone(&Utc))),
        _ => None,
    };
    parsed.ok_or_else(|| {
        PaginationError::MalformedCursor(format!("{} expects a {} value", key.name, key.kind.label()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::SortDirection;
    use chrono::TimeZone;

    fn by_id() -> SortSpec {
        SortSpec::unique(SortKey::text("id"), SortDirection::Asc)
    }

    fn by_created_at() -> SortSpec {
        SortSpec::new(SortKey::timestamp("created_at"), SortDirection::Desc, SortKey::text("id"))
    }

    fn raw(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    // ─── round trip ───

    #[test]
    fn text_cursor_round_trips() {
        let sort = by_id();
        let cursor = sort.cursor(KeyValue::Text("prod_002".into()), KeyValue::Text("prod_002".into()));
        assert_eq!(decode(&encode(&cursor), &sort).unwrap(), cursor);
    }

    #[test]
    fn timestamp_cursor_round_trips_with_sub_second_precision() {
        let sort = by_created_at();
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let cursor = sort.cursor(KeyValue::Timestamp(at), KeyValue::Text("prod_9".into()));
        assert_eq!(decode(&encode(&cursor), &sort).unwrap(), cursor);
    }

    #[test]
    fn integer_cursor_round_trips_at_extremes() {
        let sort = SortSpec::new(SortKey::integer("price"), SortDirection::Asc, SortKey::text("id"));
        for n in [i64::MIN, -1, 0, i64::MAX] {
            let cursor = sort.cursor(KeyValue::Integer(n), KeyValue::Text("x".into()));
            assert_eq!(decode(&encode(&cursor), &sort).unwrap(), cursor);
        }
    }

    #[test]
    fn encoded_form_is_url_safe() {
        let sort = by_id();
        let cursor = sort.cursor(
            KeyValue::Text("a/b+c?d=e&f \u{1F600}\n".into()),
            KeyValue::Text(String::new()),
        );
        let token = encode(&cursor);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode(&token, &sort).unwrap(), cursor);
    }

    #[test]
    fn encoding_is_deterministic() {
        let sort = by_id();
        let cursor = sort.cursor(KeyValue::Text("prod_1".into()), KeyValue::Text("prod_1".into()));
        assert_eq!(encode(&cursor), encode(&cursor.clone()));
    }

    // ─── malformed input ───

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode("not base64!", &by_id()),
            Err(PaginationError::MalformedCursor(_))
        ));
    }

    #[test]
    fn rejects_empty_token() {
        assert!(matches!(decode("", &by_id()), Err(PaginationError::MalformedCursor(_))));
    }

    #[test]
    fn rejects_non_array_json() {
        assert!(matches!(
            decode(&raw(r#"{"id":"prod_1"}"#), &by_id()),
            Err(PaginationError::MalformedCursor(_))
        ));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = decode(&raw(r#"["prod_1","prod_1"]"#), &by_id()).unwrap_err();
        assert_eq!(err, PaginationError::MalformedCursor("expected 1 values, found 2".into()));

        assert!(decode(&raw(r#"["2024-01-01T00:00:00Z"]"#), &by_created_at()).is_err());
    }

    #[test]
    fn rejects_wrong_value_type() {
        assert!(decode(&raw("[42]"), &by_id()).is_err());
        assert!(decode(&raw(r#"["yesterday","prod_1"]"#), &by_created_at()).is_err());

        let by_price = SortSpec::new(SortKey::integer("price"), SortDirection::Asc, SortKey::text("id"));
        assert!(decode(&raw(r#"[1.5,"prod_1"]"#), &by_price).is_err());
        assert!(decode(&raw(r#"["1","prod_1"]"#), &by_price).is_err());
    }

    #[test]
    fn accepts_timestamps_with_offsets() {
        let sort = by_created_at();
        let cursor = decode(&raw(r#"["2024-03-01T12:00:00+02:00","prod_1"]"#), &sort).unwrap();
        assert_eq!(
            cursor.values()[0],
            KeyValue::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }
}

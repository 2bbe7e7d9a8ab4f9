//! Document representation shared by the stores, the pipeline evaluator and
//! the record modules.
//!
//! A document is a JSON object. Nested fields are addressed with dotted paths
//! (`category.name`). Timestamps are RFC 3339 strings; the value ordering below
//! compares two strings that both parse as timestamps by instant, so
//! differently formatted timestamps still order chronologically.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine};

pub type Document = Map<String, Value>;

/// Field holding the document identifier.
pub const ID_FIELD: &str = "_id";
/// Field holding the soft-delete timestamp (`null` = active).
pub const DELETED_AT_FIELD: &str = "deleted_at";

/// Formats accepted for user supplied timestamps, besides RFC 3339.
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = doc.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Sets `value` at `path`, creating intermediate objects as needed.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                set_path(inner, rest, value);
            }
        }
    }
}

pub fn remove_path(doc: &mut Document, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => doc.remove(path),
        Some((head, rest)) => match doc.get_mut(head) {
            Some(Value::Object(inner)) => remove_path(inner, rest),
            _ => None,
        },
    }
}

pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

pub fn is_active(doc: &Document) -> bool {
    doc.get(DELETED_AT_FIELD).is_none_or(Value::is_null)
}

/// Parses a user supplied timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or
/// a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, DATE_TIME_FORMAT) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Like [`parse_timestamp`] but for the mutation paths, where a bad date is a
/// validation failure.
pub fn require_timestamp(input: &str, label: &str) -> ResultEngine<DateTime<Utc>> {
    parse_timestamp(input)
        .ok_or_else(|| EngineError::InvalidDate(format!("{label}: unparseable date '{input}'")))
}

pub fn timestamp_value(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn value_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Total-ish order between two scalar values. Returns `None` for values of
/// different kinds, which makes range predicates fail instead of guessing.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(sa), Value::String(sb)) => {
            match (value_timestamp(a), value_timestamp(b)) {
                (Some(ta), Some(tb)) => Some(ta.cmp(&tb)),
                _ => Some(sa.cmp(sb)),
            }
        }
        _ => None,
    }
}

/// Equality as used by `$match` and `$lookup`: a missing field equals `null`.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Adds two numeric values, staying in integers while both sides are.
pub fn add_numbers(acc: &Value, value: &Value) -> Value {
    match (acc.as_i64(), value.as_i64()) {
        (Some(a), Some(b)) => match a.checked_add(b) {
            Some(sum) => Value::from(sum),
            None => Value::from(a as f64 + b as f64),
        },
        _ => match (acc.as_f64(), value.as_f64()) {
            (Some(a), Some(b)) => Value::from(a + b),
            (Some(_), None) => acc.clone(),
            (None, _) => value.clone(),
        },
    }
}

pub fn to_document<T: Serialize>(record: &T) -> ResultEngine<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(EngineError::Decode(format!(
            "expected an object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> ResultEngine<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

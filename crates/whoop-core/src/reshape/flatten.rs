use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A flat record: dotted column path to value.
pub type Row = BTreeMap<String, Value>;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Flatten nested objects into dotted keys. Arrays are kept whole.
///
/// A non-object record ends up under the single column `value`.
pub fn flatten(record: &Value) -> Row {
    let mut row = Row::new();
    match record {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(key, value, &mut row);
            }
        }
        other => {
            row.insert("value".to_string(), other.clone());
        }
    }
    row
}

fn flatten_into(prefix: &str, value: &Value, row: &mut Row) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_into(&format!("{}.{}", prefix, key), nested, row);
            }
        }
        other => {
            row.insert(prefix.to_string(), other.clone());
        }
    }
}

/// Milliseconds to minutes. Non-numeric values become null.
pub fn millis_to_minutes(value: &Value) -> Value {
    value
        .as_f64()
        .and_then(|ms| serde_json::Number::from_f64(ms / MILLIS_PER_MINUTE))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Convert the named columns in place, skipping columns that are absent.
pub(crate) fn convert_millis_columns<'a>(
    row: &mut Row,
    columns: impl IntoIterator<Item = &'a str>,
) {
    for column in columns {
        if let Some(value) = row.get_mut(column) {
            *value = millis_to_minutes(value);
        }
    }
}

pub(crate) fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = value?.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Minutes between the `during.lower` and `during.upper` columns.
pub(crate) fn during_minutes(row: &Row) -> Value {
    let lower = parse_timestamp(row.get("during.lower"));
    let upper = parse_timestamp(row.get("during.upper"));
    match (lower, upper) {
        (Some(lower), Some(upper)) => {
            let minutes = (upper - lower).num_milliseconds() as f64 / MILLIS_PER_MINUTE;
            serde_json::Number::from_f64(minutes)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

/// Drop rows identical to an earlier row.
pub(crate) fn dedup_rows(rows: Vec<Row>) -> Vec<Row> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(serde_json::to_string(row).unwrap_or_default()))
        .collect()
}

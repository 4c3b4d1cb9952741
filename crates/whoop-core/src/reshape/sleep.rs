//! Sleep tables from full sleep records.

use serde_json::Value;

use super::flatten::{convert_millis_columns, during_minutes, flatten, Row};

/// Sleep metrics reported in milliseconds.
const SLEEP_MILLIS_COLUMNS: [&str; 16] = [
    "qualityDuration",
    "latency",
    "debtPre",
    "debtPost",
    "needFromStrain",
    "sleepNeed",
    "habitualSleepNeed",
    "timeInBed",
    "lightSleepDuration",
    "slowWaveSleepDuration",
    "remSleepDuration",
    "wakeDuration",
    "arousalTime",
    "noDataDuration",
    "creditFromNaps",
    "projectedSleep",
];

/// One row per sleep with durations in minutes. Events are dropped; use
/// `process_sleep_events` for those.
pub fn process_sleep(sleeps: &[Value]) -> Vec<Row> {
    sleeps
        .iter()
        .map(|sleep| {
            let mut row = flatten(sleep);
            convert_millis_columns(&mut row, SLEEP_MILLIS_COLUMNS);
            row.remove("during.bounds");
            row.remove("events");
            row
        })
        .collect()
}

/// One row per sleep event, tagged with the parent sleep's `id`.
pub fn process_sleep_events(sleeps: &[Value]) -> Vec<Row> {
    let mut rows = Vec::new();
    for sleep in sleeps {
        let Some(events) = sleep.get("events").and_then(Value::as_array) else {
            continue;
        };
        let sleep_id = sleep.get("id").cloned().unwrap_or(Value::Null);
        for event in events {
            let mut row = flatten(event);
            row.insert("id".to_string(), sleep_id.clone());
            row.remove("during.bounds");
            row.insert("total_minutes".to_string(), during_minutes(&row));
            rows.push(row);
        }
    }
    rows
}

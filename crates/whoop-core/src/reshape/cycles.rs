//! Cycle ("key data") and workout tables from legacy cycle records.

use std::collections::HashSet;

use serde_json::Value;

use super::flatten::{
    convert_millis_columns, dedup_rows, during_minutes, flatten, millis_to_minutes, parse_timestamp,
    Row,
};

/// Sleep columns reported in milliseconds, relative to `sleep.`.
const CYCLE_SLEEP_MILLIS_COLUMNS: [&str; 6] = [
    "sleep.qualityDuration",
    "sleep.needBreakdown.baseline",
    "sleep.needBreakdown.debt",
    "sleep.needBreakdown.naps",
    "sleep.needBreakdown.strain",
    "sleep.needBreakdown.total",
];

/// Heart-rate zones reported per workout.
const ZONE_COUNT: usize = 6;

/// One row per cycle day with sleep durations in minutes.
///
/// `days` collapses to its first entry as `day`, nap durations are summed
/// into `nap_duration`, and repeated `(day, sleep.id)` pairs are dropped.
pub fn process_keydata(cycles: &[Value]) -> Vec<Row> {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(cycles.len());

    for cycle in cycles {
        let mut row = flatten(cycle);

        let day = row
            .remove("days")
            .and_then(|days| days.as_array().and_then(|d| d.first().cloned()))
            .unwrap_or(Value::Null);
        row.insert("day".to_string(), day);

        convert_millis_columns(&mut row, CYCLE_SLEEP_MILLIS_COLUMNS);

        let naps = row.remove("sleep.naps");
        row.insert("nap_duration".to_string(), nap_duration(naps.as_ref()));

        let key = (
            row.get("day").map(Value::to_string).unwrap_or_default(),
            row.get("sleep.id").map(Value::to_string).unwrap_or_default(),
        );
        if seen.insert(key) {
            rows.push(row);
        }
    }
    rows
}

/// Total quality duration of a cycle's naps, in minutes.
fn nap_duration(naps: Option<&Value>) -> Value {
    let total_ms: f64 = naps
        .and_then(Value::as_array)
        .map(|naps| {
            naps.iter()
                .filter_map(|nap| nap.get("qualityDuration").and_then(Value::as_f64))
                .sum()
        })
        .unwrap_or(0.0);
    millis_to_minutes(&Value::from(total_ms))
}

/// One row per cycle's first workout, with durations in minutes.
///
/// Takes rows from `process_keydata` (or any flattened cycles) and skips
/// those without workouts.
pub fn process_activities(rows: &[Row]) -> Vec<Row> {
    let activities = rows
        .iter()
        .filter_map(|row| row.get("strain.workouts")?.as_array()?.first())
        .map(|workout| {
            let mut act = flatten(workout);
            act.insert("total_minutes".to_string(), during_minutes(&act));

            let zones = act.remove("zones");
            for z in 0..ZONE_COUNT {
                let ms = zones
                    .as_ref()
                    .and_then(|zones| zones.get(z))
                    .cloned()
                    .unwrap_or(Value::Null);
                act.insert(format!("zone{}_minutes", z + 1), millis_to_minutes(&ms));
            }

            let day = parse_timestamp(act.get("during.lower"))
                .map(|dt| Value::String(dt.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null);
            act.insert("day".to_string(), day);
            act.remove("during.bounds");
            act
        })
        .collect();
    dedup_rows(activities)
}

/// Distinct sleep ids referenced by cycle rows, in first-seen order.
pub fn extract_sleep_ids(rows: &[Row]) -> Vec<i64> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| {
            let id = row.get("sleep.id")?;
            id.as_i64().or_else(|| id.as_f64().map(|f| f as i64))
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

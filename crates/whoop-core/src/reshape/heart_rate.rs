use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::models::HeartRateValue;

/// A heart-rate reading split into UTC date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeartRateSample {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub bpm: i64,
}

/// Convert raw samples, skipping timestamps outside chrono's range.
pub fn heart_rate_samples(values: &[HeartRateValue]) -> Vec<HeartRateSample> {
    values
        .iter()
        .filter_map(|v| match DateTime::from_timestamp_millis(v.time) {
            Some(ts) => Some(HeartRateSample {
                date: ts.date_naive(),
                time: ts.time(),
                bpm: v.data,
            }),
            None => {
                debug!(time = v.time, "Skipping heart rate sample with invalid timestamp");
                None
            }
        })
        .collect()
}

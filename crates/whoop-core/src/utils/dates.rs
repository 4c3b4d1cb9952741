//! Date parsing, range validation and window generation for API queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Date format accepted from callers.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Width of one legacy query window.
const WINDOW_DAYS: i64 = 7;

/// Range used by the collection helpers when no start date is given.
const DEFAULT_LOOKBACK_DAYS: i64 = 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("End date {end} cannot be in the future")]
    EndInFuture { end: NaiveDate },
}

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: value.to_string(),
    })
}

/// Validate a `YYYY-MM-DD` date range against the current time.
pub fn validate_date_range(
    start: &str,
    end: &str,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    validate_date_range_at(start, end, Utc::now())
}

/// Validate a date range against an explicit `now`.
pub fn validate_date_range_at(
    start: &str,
    end: &str,
    now: DateTime<Utc>,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    check_range(start, end, now)?;
    Ok((start, end))
}

fn check_range(
    start: NaiveDate,
    end: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::StartAfterEnd { start, end });
    }
    if midnight(end) > now {
        return Err(ValidationError::EndInFuture { end });
    }
    Ok(())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Format a timestamp the way the API expects: UTC, millisecond precision, `Z` suffix.
pub fn format_api_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Resolve optional caller dates into a query range.
///
/// The end date is inclusive, so the range runs to the following midnight,
/// clamped to `now`. Without a start date the range covers the week before
/// the end date; without an end date it ends today.
pub fn collection_range(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let end_date = match end {
        Some(s) => parse_date(s)?,
        None => now.date_naive(),
    };
    let start_date = match start {
        Some(s) => parse_date(s)?,
        None => end_date - Duration::days(DEFAULT_LOOKBACK_DAYS),
    };
    check_range(start_date, end_date, now)?;

    let range_end = (midnight(end_date) + Duration::days(1)).min(now);
    Ok((midnight(start_date), range_end))
}

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Consecutive one-week windows starting at `start`, for every window that
/// begins at or before `now`. The last window may extend past `now`.
pub fn weekly_windows(start: DateTime<Utc>, now: DateTime<Utc>) -> Vec<DateWindow> {
    let step = Duration::days(WINDOW_DAYS);
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor <= now {
        windows.push(DateWindow {
            start: cursor,
            end: cursor + step,
        });
        cursor += step;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_start_after_end() {
        let err = validate_date_range("2024-01-10", "2024-01-01").unwrap_err();
        assert!(matches!(err, ValidationError::StartAfterEnd { .. }));
    }

    #[test]
    fn test_validate_end_in_future() {
        let tomorrow = (Utc::now() + Duration::days(1)).format(DATE_FORMAT).to_string();
        let err = validate_date_range("2024-01-01", &tomorrow).unwrap_err();
        assert!(matches!(err, ValidationError::EndInFuture { .. }));
    }

    #[test]
    fn test_validate_ok() {
        let (start, end) =
            validate_date_range_at("2024-01-01", "2024-01-10", utc(2024, 2, 1)).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());

        // Same day and today are both allowed
        assert!(validate_date_range_at("2024-02-01", "2024-02-01", utc(2024, 2, 1)).is_ok());
    }

    #[test]
    fn test_validate_malformed() {
        let err = validate_date_range("01/01/2024", "2024-01-10").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDate {
                value: "01/01/2024".to_string()
            }
        );
    }

    #[test]
    fn test_format_api_timestamp() {
        assert_eq!(format_api_timestamp(utc(2024, 1, 8)), "2024-01-08T00:00:00.000Z");
    }

    #[test]
    fn test_weekly_windows() {
        let windows = weekly_windows(utc(2024, 1, 1), utc(2024, 1, 20));
        assert_eq!(
            windows,
            vec![
                DateWindow { start: utc(2024, 1, 1), end: utc(2024, 1, 8) },
                DateWindow { start: utc(2024, 1, 8), end: utc(2024, 1, 15) },
                DateWindow { start: utc(2024, 1, 15), end: utc(2024, 1, 22) },
            ]
        );
    }

    #[test]
    fn test_weekly_windows_boundaries() {
        // A window starting exactly at `now` is still issued
        assert_eq!(weekly_windows(utc(2024, 1, 1), utc(2024, 1, 8)).len(), 2);
        // Start in the future yields nothing
        assert!(weekly_windows(utc(2024, 2, 1), utc(2024, 1, 8)).is_empty());

        // Consecutive windows share a boundary
        let windows = weekly_windows(utc(2024, 1, 1), utc(2024, 1, 10));
        assert_eq!(windows[0].end, windows[1].start);
    }

    #[test]
    fn test_collection_range_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();
        let (start, end) = collection_range(None, None, now).unwrap();
        assert_eq!(start, utc(2024, 3, 3));
        assert_eq!(end, now);
    }

    #[test]
    fn test_collection_range_explicit() {
        let now = utc(2024, 3, 10);
        let (start, end) = collection_range(Some("2024-01-01"), Some("2024-01-31"), now).unwrap();
        assert_eq!(start, utc(2024, 1, 1));
        assert_eq!(end, utc(2024, 2, 1));
    }
}

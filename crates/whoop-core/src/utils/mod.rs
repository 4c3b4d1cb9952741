//! Utility functions for date handling.

pub mod dates;

pub use dates::{
    format_api_timestamp, parse_date, validate_date_range, weekly_windows, DateWindow,
    ValidationError,
};

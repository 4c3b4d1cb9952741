//! Reshaping of raw API records into flat rows.
//!
//! Records are flattened with dotted column names (`score.strain`), and
//! millisecond durations are converted to minutes. Duplicate suppression
//! happens here, never in the retriever.

pub mod cycles;
pub mod flatten;
pub mod heart_rate;
pub mod sleep;

pub use cycles::{extract_sleep_ids, process_activities, process_keydata};
pub use flatten::{flatten, millis_to_minutes, Row};
pub use heart_rate::{heart_rate_samples, HeartRateSample};
pub use sleep::{process_sleep, process_sleep_events};

use serde::{Deserialize, Serialize};

/// One heart-rate reading from the legacy metrics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateValue {
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    /// Beats per minute.
    pub data: i64,
}

#[derive(Debug, Deserialize)]
pub struct HeartRateResponse {
    pub values: Vec<HeartRateValue>,
}

//! Legacy per-user endpoints on the auth host.
//!
//! These endpoints have no cursor. Full history is fetched by walking
//! one-week windows from the account's creation date up to now, one request
//! per window.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::client::{WhoopClient, NO_QUERY};
use crate::error::{Error, Result};
use crate::models::{HeartRateResponse, HeartRateValue};
use crate::utils::dates::{format_api_timestamp, weekly_windows, DateWindow};

/// Heart-rate samples are returned in time order at this step (seconds).
const HEART_RATE_STEP: u32 = 6;

#[derive(Serialize)]
struct WindowQuery {
    start: String,
    end: String,
}

impl From<&DateWindow> for WindowQuery {
    fn from(window: &DateWindow) -> Self {
        Self {
            start: format_api_timestamp(window.start),
            end: format_api_timestamp(window.end),
        }
    }
}

#[derive(Serialize)]
struct HeartRateQuery {
    start: String,
    end: String,
    order: &'static str,
    step: u32,
}

impl WhoopClient {
    /// User id and account start of the current session, authenticating
    /// if needed.
    async fn session_origin(&mut self) -> Result<(i64, chrono::DateTime<chrono::Utc>)> {
        let session = self.auth.session().await?;
        Ok((session.user_id, session.account_start))
    }

    fn legacy_url(&self, user_id: i64, path: &str) -> String {
        format!("{}/users/{}/{}", self.legacy_url, user_id, path)
    }

    /// Weekly windows covering the whole account history.
    pub async fn history_windows(&mut self) -> Result<Vec<DateWindow>> {
        let (_, account_start) = self.session_origin().await?;
        Ok(weekly_windows(account_start, self.clock.now()))
    }

    /// Cycles for a single window.
    pub async fn get_cycles_in(&mut self, window: &DateWindow) -> Result<Vec<Value>> {
        let (user_id, _) = self.session_origin().await?;
        let url = self.legacy_url(user_id, "cycles");
        self.get(&url, &WindowQuery::from(window), "cycles").await
    }

    /// Every cycle since the account was created.
    pub async fn get_all_cycles(&mut self) -> Result<Vec<Value>> {
        let windows = self.history_windows().await?;
        let mut cycles = Vec::new();
        for window in &windows {
            let batch = self.get_cycles_in(window).await?;
            debug!(start = %window.start, count = batch.len(), "Fetched cycle window");
            cycles.extend(batch);
        }
        info!(windows = windows.len(), cycles = cycles.len(), "Fetched cycle history");
        Ok(cycles)
    }

    /// Heart-rate samples for a single window.
    pub async fn get_heart_rate_in(&mut self, window: &DateWindow) -> Result<Vec<HeartRateValue>> {
        let (user_id, _) = self.session_origin().await?;
        let url = self.legacy_url(user_id, "metrics/heart_rate");
        let query = HeartRateQuery {
            start: format_api_timestamp(window.start),
            end: format_api_timestamp(window.end),
            order: "t",
            step: HEART_RATE_STEP,
        };
        let response: HeartRateResponse = self.get(&url, &query, "heart rate").await?;
        Ok(response.values)
    }

    /// Every heart-rate sample since the account was created.
    pub async fn get_all_heart_rate(&mut self) -> Result<Vec<HeartRateValue>> {
        let windows = self.history_windows().await?;
        let mut samples = Vec::new();
        for window in &windows {
            samples.extend(self.get_heart_rate_in(window).await?);
        }
        info!(windows = windows.len(), samples = samples.len(), "Fetched heart rate history");
        Ok(samples)
    }

    /// Full sleep records for the given sleep ids, in the given order.
    pub async fn get_sleep(&mut self, sleep_ids: &[i64]) -> Result<Vec<Value>> {
        let (user_id, _) = self.session_origin().await?;
        let mut sleeps = Vec::with_capacity(sleep_ids.len());
        for id in sleep_ids {
            let url = self.legacy_url(user_id, &format!("sleeps/{}", id));
            let sleep: Value = self.get(&url, NO_QUERY, "sleep").await?;
            if !sleep.is_object() {
                return Err(Error::parsing("sleep", format!("expected an object for sleep {}", id)));
            }
            sleeps.push(sleep);
        }
        Ok(sleeps)
    }
}

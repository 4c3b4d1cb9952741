//! API client for the WHOOP REST API.
//!
//! This module provides the `WhoopClient` struct for making authenticated
//! requests: account endpoints, the paginated v1 collections, and (in
//! `legacy.rs`) the older per-user endpoints walked in weekly windows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::pagination::{Collection, Page, PageQuery};
use super::ApiError;
use crate::auth::Authenticator;
use crate::cache::{EncryptedFileStore, MemoryStore, TokenStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{ClientSettings, Config, Credentials};
use crate::error::{Error, Result};
use crate::models::{BodyMeasurement, UserProfile};
use crate::utils::dates::{collection_range, format_api_timestamp};

const PROFILE_PATH: &str = "v1/user/profile/basic";
const BODY_MEASUREMENT_PATH: &str = "v1/user/measurement/body";

pub(super) const NO_QUERY: &[(&str, &str)] = &[];

/// API client for WHOOP. One authenticated user per instance.
pub struct WhoopClient {
    pub(super) http: Client,
    api_url: String,
    pub(super) legacy_url: String,
    page_size: u32,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) auth: Authenticator,
}

impl WhoopClient {
    /// Create a client with the encrypted on-disk token cache.
    pub fn new(config: Config) -> Result<Self> {
        let store: Box<dyn TokenStore> =
            match EncryptedFileStore::locate(config.settings.cache_dir.as_deref()) {
                Ok(store) => Box::new(store),
                Err(e) => {
                    warn!(error = %e, "Token cache unavailable, tokens will not persist");
                    Box::new(MemoryStore::new())
                }
            };
        Self::with_store(config.credentials, config.settings, store, Arc::new(SystemClock))
    }

    /// Create a client with an explicit token store and clock.
    pub fn with_store(
        credentials: Credentials,
        settings: ClientSettings,
        store: Box<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(settings.request_timeout).build()?;
        let auth = Authenticator::new(http.clone(), credentials, &settings, store, clock.clone());

        Ok(Self {
            http,
            api_url: settings.api_url,
            legacy_url: settings.auth_url,
            page_size: settings.page_size,
            clock,
            auth,
        })
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    pub fn authenticator_mut(&mut self) -> &mut Authenticator {
        &mut self.auth
    }

    /// Authenticate now rather than on the first request.
    pub async fn authenticate(&mut self) -> Result<()> {
        self.auth.authenticate().await
    }

    pub fn user_id(&self) -> Option<i64> {
        self.auth.user_id()
    }

    pub fn logout(&mut self) {
        self.auth.logout();
    }

    /// Check if response is successful, returning an error with body if not.
    pub(super) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), url = %url, "Request failed");
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Authenticated GET, decoding the body as `T`.
    pub(super) async fn get<T, Q>(
        &mut self,
        url: &str,
        query: &Q,
        context: &'static str,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let headers = self.auth.get_headers().await?;
        let response = self.http.get(url).headers(headers).query(query).send().await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| Error::parsing(context, e))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    // ===== Account =====

    pub async fn get_profile(&mut self) -> Result<UserProfile> {
        let url = self.api_url(PROFILE_PATH);
        self.get(&url, NO_QUERY, "user profile").await
    }

    pub async fn get_body_measurement(&mut self) -> Result<BodyMeasurement> {
        let url = self.api_url(BODY_MEASUREMENT_PATH);
        self.get(&url, NO_QUERY, "body measurement").await
    }

    // ===== Collections =====

    /// Fetch every record of a collection between `start` and `end`,
    /// following `next_token` until the last page. Pages are requested one
    /// at a time and concatenated in order; any failed page fails the whole
    /// call.
    pub async fn fetch_collection(
        &mut self,
        collection: Collection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Value>> {
        let url = self.api_url(collection.path());
        let mut query = PageQuery::new(
            format_api_timestamp(start),
            format_api_timestamp(end),
            self.page_size,
        );
        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            let page: Page = self.get(&url, &query, collection.name()).await?;
            pages += 1;
            debug!(
                collection = collection.path(),
                page = pages,
                count = page.records.len(),
                "Fetched page"
            );

            let next = page.next_cursor().map(str::to_string);
            records.extend(page.records);
            match next {
                Some(token) => query.next_token = Some(token),
                None => break,
            }
        }

        info!(collection = collection.path(), pages, records = records.len(), "Fetched collection");
        Ok(records)
    }

    /// Fetch a collection for optional `YYYY-MM-DD` dates, defaulting to the
    /// past week. Dates are validated before any request is sent.
    pub async fn get_collection(
        &mut self,
        collection: Collection,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Value>> {
        let (start, end) = collection_range(start_date, end_date, self.clock.now())?;
        self.fetch_collection(collection, start, end).await
    }

    pub async fn get_cycle_collection(
        &mut self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Value>> {
        self.get_collection(Collection::Cycle, start_date, end_date).await
    }

    pub async fn get_recovery_collection(
        &mut self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Value>> {
        self.get_collection(Collection::Recovery, start_date, end_date).await
    }

    pub async fn get_sleep_collection(
        &mut self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Value>> {
        self.get_collection(Collection::Sleep, start_date, end_date).await
    }

    pub async fn get_workout_collection(
        &mut self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Value>> {
        self.get_collection(Collection::Workout, start_date, end_date).await
    }
}

impl std::fmt::Display for WhoopClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.auth.user_id() {
            Some(id) => write!(f, "WhoopClient({})", id),
            None => write!(f, "WhoopClient(<Unauthenticated>)"),
        }
    }
}

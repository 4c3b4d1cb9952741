use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::session::{SessionToken, TokenState};
use crate::api::ApiError;
use crate::cache::TokenStore;
use crate::clock::Clock;
use crate::config::{ClientSettings, Credentials, GrantStyle};
use crate::error::{Error, Result};
use crate::models::TokenResponse;

const TOKEN_PATH: &str = "oauth/token";

/// JSON body of the password grant, as the mobile app sends it.
#[derive(Serialize)]
struct PasswordGrant<'a> {
    username: &'a str,
    password: &'a str,
    grant_type: &'static str,
    #[serde(rename = "issueRefresh")]
    issue_refresh: bool,
}

/// Holds the current session and renews it when it lapses.
///
/// Expiry is detected lazily: nothing happens until `get_headers` finds the
/// token expired, at which point the cache and then the network are tried.
pub struct Authenticator {
    http: Client,
    token_url: String,
    credentials: Credentials,
    grant_style: GrantStyle,
    token_lifetime: Duration,
    store: Box<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    token: Option<SessionToken>,
}

impl Authenticator {
    pub fn new(
        http: Client,
        credentials: Credentials,
        settings: &ClientSettings,
        store: Box<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            token_url: format!("{}/{}", settings.auth_url, TOKEN_PATH),
            credentials,
            grant_style: settings.grant_style,
            token_lifetime: settings.token_lifetime,
            store,
            clock,
            token: None,
        }
    }

    pub fn state(&self) -> TokenState {
        TokenState::of(self.token.as_ref(), self.clock.now())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == TokenState::Valid
    }

    /// User ID of the current session, if any.
    pub fn user_id(&self) -> Option<i64> {
        self.token.as_ref().map(|t| t.user_id)
    }

    /// Account creation time of the current session, if any.
    pub fn account_start(&self) -> Option<DateTime<Utc>> {
        self.token.as_ref().map(|t| t.account_start)
    }

    /// Adopt a cached token if one is still valid, otherwise log in.
    pub async fn authenticate(&mut self) -> Result<()> {
        let now = self.clock.now();
        if let Some(cached) = self.store.load(now) {
            info!(
                user_id = cached.user_id,
                minutes_left = cached.minutes_until_expiry(now),
                "Using cached authentication"
            );
            self.token = Some(cached);
            return Ok(());
        }
        let token = self.login().await?;
        self.token = Some(token);
        Ok(())
    }

    /// Perform the password grant against the token endpoint.
    async fn login(&mut self) -> Result<SessionToken> {
        debug!(url = %self.token_url, style = ?self.grant_style, "Requesting access token");

        let request = self.http.post(&self.token_url);
        let request = match self.grant_style {
            GrantStyle::Json => request.json(&PasswordGrant {
                username: &self.credentials.username,
                password: &self.credentials.password,
                grant_type: "password",
                issue_refresh: false,
            }),
            GrantStyle::Form => request.form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ]),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "Authentication rejected");
            return Err(Error::Authentication {
                status: status.as_u16(),
                body: ApiError::truncate_body(&body),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::parsing("token response", e))?;

        let now = self.clock.now();
        let token = SessionToken {
            bearer: parsed.access_token,
            user_id: parsed.user.id,
            issued_at: now,
            expires_at: now + self.token_lifetime,
            account_start: parsed.user.profile.created_at,
        };

        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "Failed to cache authentication token");
        }
        info!(user_id = token.user_id, "Authentication successful");
        Ok(token)
    }

    /// Make sure a valid session is held and return it.
    pub(crate) async fn session(&mut self) -> Result<&SessionToken> {
        if self.state() != TokenState::Valid {
            debug!(state = ?self.state(), "Session not valid, authenticating");
            self.authenticate().await?;
        }
        self.token
            .as_ref()
            .ok_or_else(|| Error::parsing("session", "no token after authentication"))
    }

    /// Authorization headers for a data request.
    pub async fn get_headers(&mut self) -> Result<HeaderMap> {
        let token = self.session().await?;
        let mut value = HeaderValue::from_str(&token.authorization())
            .map_err(|e| Error::parsing("access token", e))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Drop the current session, in memory and in the store.
    pub fn logout(&mut self) {
        self.token = None;
        self.store.invalidate();
        info!("Logged out");
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("token_url", &self.token_url)
            .field("username", &self.credentials.username)
            .field("state", &self.state())
            .finish()
    }
}

//! Client configuration management.
//!
//! Configuration is read from a YAML file holding the account credentials
//! and optional client settings:
//!
//! ```yaml
//! username: me@example.com
//! password: hunter2
//! grant_style: json        # or "form"
//! token_lifetime_hours: 24
//! ```
//!
//! `WHOOP_USERNAME` / `WHOOP_PASSWORD` override the file values when set.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default host for the token endpoint and the legacy per-user endpoints.
pub const DEFAULT_AUTH_URL: &str = "https://api-7.whoop.com";

/// Default host for the v1 collection endpoints.
pub const DEFAULT_API_URL: &str = "https://api.prod.whoop.com/developer";

/// The API does not report a token lifetime, so this is an assumption.
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Largest page the collection endpoints will return.
pub const MAX_PAGE_SIZE: u32 = 25;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const USERNAME_ENV: &str = "WHOOP_USERNAME";
const PASSWORD_ENV: &str = "WHOOP_PASSWORD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing required field in config file: {0}")]
    MissingField(&'static str),

    #[error("Empty value for required field in config file: {0}")]
    EmptyField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Account credentials. Only ever sent in the token request body.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body encoding for the password-grant token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStyle {
    /// JSON body with `issueRefresh: false`, as the mobile app sends it.
    #[default]
    Json,
    /// Standard OAuth2 form-encoded body.
    Form,
}

/// Tunables for the HTTP client and token cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub auth_url: String,
    pub api_url: String,
    pub grant_style: GrantStyle,
    pub token_lifetime: chrono::Duration,
    pub page_size: u32,
    pub request_timeout: std::time::Duration,
    /// Directory holding the key and token cache files. `None` means the
    /// user's home directory.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            grant_style: GrantStyle::default(),
            token_lifetime: chrono::Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
            page_size: MAX_PAGE_SIZE,
            request_timeout: std::time::Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_dir: None,
        }
    }
}

impl ClientSettings {
    /// Settings pointing both hosts at one base URL (mock servers, proxies).
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            auth_url: base.clone(),
            api_url: base,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub settings: ClientSettings,
}

/// On-disk shape. Everything optional so missing fields can be reported
/// by name instead of as a generic parse failure.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    auth_url: Option<String>,
    api_url: Option<String>,
    grant_style: Option<GrantStyle>,
    token_lifetime_hours: Option<i64>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
    cache_dir: Option<PathBuf>,
}

impl RawConfig {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not a mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    fn settings(&self) -> Result<ClientSettings, ConfigError> {
        let mut settings = ClientSettings::default();
        if let Some(url) = &self.auth_url {
            settings.auth_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &self.api_url {
            settings.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(style) = self.grant_style {
            settings.grant_style = style;
        }
        if let Some(hours) = self.token_lifetime_hours {
            if hours <= 0 {
                return Err(ConfigError::Invalid {
                    field: "token_lifetime_hours",
                    reason: format!("must be positive, got {}", hours),
                });
            }
            settings.token_lifetime = chrono::Duration::hours(hours);
        }
        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::Invalid {
                    field: "page_size",
                    reason: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, size),
                });
            }
            settings.page_size = size;
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout = std::time::Duration::from_secs(secs);
        }
        settings.cache_dir = self.cache_dir.clone();
        Ok(settings)
    }
}

impl ClientSettings {
    /// Read only the client settings from a config file. Credentials may be
    /// absent; used by operations that never talk to the API.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        RawConfig::read(path.as_ref())?.settings()
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = RawConfig::read(path.as_ref())?;
        Self::from_raw(raw, |key| std::env::var(key).ok())
    }

    /// Parse and validate config contents.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let raw = RawConfig::parse(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        Self::from_raw(raw, |key| std::env::var(key).ok())
    }

    fn from_raw(
        raw: RawConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // An empty variable (e.g. from a `.env` template) does not override the file.
        let username = env(USERNAME_ENV).filter(|v| !v.is_empty()).or(raw.username.clone());
        let password = env(PASSWORD_ENV).filter(|v| !v.is_empty()).or(raw.password.clone());

        let credentials = Credentials {
            username: required("username", username)?,
            password: required("password", password)?,
        };
        let settings = raw.settings()?;

        Ok(Self {
            credentials,
            settings,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::MissingField(field)),
        Some(v) if v.is_empty() => Err(ConfigError::EmptyField(field)),
        Some(v) => Ok(v),
    }
}

/// Load a config file and return just the credentials.
pub fn load_config(path: impl AsRef<Path>) -> Result<Credentials, ConfigError> {
    Config::load(path).map(|c| c.credentials)
}

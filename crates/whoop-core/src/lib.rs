//! Client library for the WHOOP fitness-tracker API.
//!
//! The pieces, in the order a request flows through them:
//!
//! - `config`: credentials and client settings from a YAML file
//! - `auth`: password-grant login, session token and lazy expiry
//! - `cache`: encrypted on-disk token store (or an in-memory one)
//! - `api`: `WhoopClient`, cursor-paginated collections and legacy
//!   weekly-window endpoints
//! - `reshape`: flattening and unit conversion of raw records
//!
//! ```no_run
//! # async fn run() -> whoop_core::Result<()> {
//! use whoop_core::{Config, WhoopClient};
//!
//! let config = Config::load("config.yaml")?;
//! let mut client = WhoopClient::new(config)?;
//! let cycles = client.get_cycle_collection(Some("2024-01-01"), Some("2024-01-31")).await?;
//! println!("{} cycles", cycles.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod reshape;
pub mod utils;

pub use api::{ApiError, Collection, WhoopClient};
pub use auth::{Authenticator, SessionToken, TokenState};
pub use cache::{EncryptedFileStore, MemoryStore, TokenStore};
pub use clock::{Clock, SystemClock};
pub use config::{load_config, ClientSettings, Config, ConfigError, Credentials, GrantStyle};
pub use error::{Error, Result};
pub use utils::dates::{validate_date_range, ValidationError};

//! Crate-level error type.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::utils::dates::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Authentication failed with status {status}: {body}")]
    Authentication { status: u16, body: String },

    #[error("Failed to parse {context}: {message}")]
    Parsing {
        context: &'static str,
        message: String,
    },

    #[error(transparent)]
    Request(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn parsing(context: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Parsing {
            context,
            message: err.to_string(),
        }
    }
}

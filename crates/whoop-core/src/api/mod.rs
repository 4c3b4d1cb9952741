//! REST API client module for WHOOP services.
//!
//! This module provides the `WhoopClient` for fetching account data and
//! health records. Collection endpoints are cursor-paginated; the legacy
//! per-user endpoints are walked in weekly date windows.
//!
//! Requests carry a bearer token obtained through the password-grant
//! token endpoint (see `crate::auth`).

pub mod client;
pub mod error;
mod legacy;
pub mod pagination;

pub use client::WhoopClient;
pub use error::ApiError;
pub use pagination::{Collection, Page, PageQuery};

//! Authentication module for managing the user's session.
//!
//! This module provides:
//! - `SessionToken`: bearer token with its owner, account start date and expiry
//! - `TokenState`: pure classification of a token at a point in time
//! - `Authenticator`: password-grant login with cache-first token reuse
//!
//! The API does not report token lifetimes; tokens are assumed to last a
//! configurable duration (24 hours by default).

pub mod authenticator;
pub mod session;

pub use authenticator::Authenticator;
pub use session::{SessionToken, TokenState};

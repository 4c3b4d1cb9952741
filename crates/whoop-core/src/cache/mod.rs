//! Local persistence for the session token.
//!
//! This module provides the `TokenStore` trait and two implementations:
//! - `EncryptedFileStore`: token encrypted on disk under a locally generated key
//! - `MemoryStore`: process-local store, used in tests and cache-less runs
//!
//! A store that cannot be read is treated as empty; the caller simply
//! authenticates again.

pub mod encrypted;
pub mod store;

pub use encrypted::EncryptedFileStore;
pub use store::{CacheError, MemoryStore, TokenStore};

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::SessionToken;

/// Failures inside a token store. These never leave the auth layer: a
/// broken cache only means the next login goes to the network.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key file: {0}")]
    Key(String),

    #[error("Failed to encrypt token cache")]
    Encrypt,

    #[error("Failed to decrypt token cache")]
    Decrypt,

    #[error("Malformed cached token: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Could not find home directory")]
    NoHomeDir,
}

/// Persistence for the session token.
pub trait TokenStore: Send {
    /// Return the stored token if it can be read and has not expired at
    /// `now`. Anything unreadable or expired is removed.
    fn load(&mut self, now: DateTime<Utc>) -> Option<SessionToken>;

    /// Replace the stored token.
    fn save(&mut self, token: &SessionToken) -> Result<(), CacheError>;

    /// Remove the stored token, if any.
    fn invalidate(&mut self);
}

/// In-process token store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<SessionToken>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, without expiry checks.
    pub fn peek(&self) -> Option<SessionToken> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).as_ref().cloned()
    }
}

impl TokenStore for MemoryStore {
    fn load(&mut self, now: DateTime<Utc>) -> Option<SessionToken> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref().map(|t| t.is_expired_at(now)) {
            Some(false) => slot.as_ref().cloned(),
            Some(true) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    fn save(&mut self, token: &SessionToken) -> Result<(), CacheError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        Ok(())
    }

    fn invalidate(&mut self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_at: DateTime<Utc>) -> SessionToken {
        SessionToken {
            bearer: "tok".to_string(),
            user_id: 7,
            issued_at: expires_at - Duration::hours(24),
            expires_at,
            account_start: expires_at - Duration::days(365),
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let now = Utc::now();
        let mut store = MemoryStore::new();
        assert!(store.load(now).is_none());

        let t = token(now + Duration::hours(1));
        store.save(&t).unwrap();
        assert_eq!(store.load(now), Some(t));
    }

    #[test]
    fn test_memory_store_drops_expired() {
        let now = Utc::now();
        let mut store = MemoryStore::new();
        let handle = store.clone();
        store.save(&token(now - Duration::seconds(1))).unwrap();

        assert!(store.load(now).is_none());
        assert!(handle.peek().is_none());
    }

    #[test]
    fn test_memory_store_invalidate() {
        let now = Utc::now();
        let mut store = MemoryStore::new();
        store.save(&token(now + Duration::hours(1))).unwrap();
        store.invalidate();
        assert!(store.load(now).is_none());
    }
}

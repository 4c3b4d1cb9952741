//! Encrypted on-disk token store.
//!
//! Two files live in the cache directory: a base64 key file holding 32
//! random bytes, and the token cache itself (a 12-byte nonce followed by the
//! ChaCha20-Poly1305 ciphertext of the token's JSON).

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::{debug, warn};

use super::store::{CacheError, TokenStore};
use crate::auth::SessionToken;

pub const KEY_FILE: &str = ".whoop_auth_key";
pub const CACHE_FILE: &str = ".whoop_auth_cache";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

pub struct EncryptedFileStore {
    dir: PathBuf,
}

impl EncryptedFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the user's home directory.
    pub fn in_home_dir() -> Result<Self, CacheError> {
        let home = dirs::home_dir().ok_or(CacheError::NoHomeDir)?;
        Ok(Self::new(home))
    }

    /// Store in `cache_dir` when configured, otherwise the home directory.
    pub fn locate(cache_dir: Option<&Path>) -> Result<Self, CacheError> {
        match cache_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::in_home_dir(),
        }
    }

    /// Whether a token cache file is present, without decrypting it.
    pub fn has_cached_token(&self) -> bool {
        self.cache_path().exists()
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    /// Read the key file, generating it on first use.
    fn load_or_create_key(&self) -> Result<[u8; KEY_LEN], CacheError> {
        let path = self.key_path();
        if path.exists() {
            restrict_permissions(&path)?;
            let encoded = fs::read_to_string(&path)?;
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| CacheError::Key(e.to_string()))?;
            return bytes.try_into().map_err(|b: Vec<u8>| {
                CacheError::Key(format!("expected {} bytes, got {}", KEY_LEN, b.len()))
            });
        }
        self.create_key()
    }

    fn create_key(&self) -> Result<[u8; KEY_LEN], CacheError> {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        write_private(&self.key_path(), STANDARD.encode(key).as_bytes())?;
        debug!(path = %self.key_path().display(), "Generated token cache key");
        Ok(key)
    }

    fn read_token(&self) -> Result<Option<SessionToken>, CacheError> {
        let path = self.cache_path();
        if !path.exists() {
            return Ok(None);
        }
        let mut data = Vec::new();
        {
            let mut file = File::open(&path)?;
            file.read_to_end(&mut data)?;
        }
        let key = self.load_or_create_key()?;
        let plaintext = decrypt(&key, &data)?;
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    fn remove_cache_file(&self) {
        let path = self.cache_path();
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed token cache"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove token cache"),
        }
    }
}

impl TokenStore for EncryptedFileStore {
    fn load(&mut self, now: DateTime<Utc>) -> Option<SessionToken> {
        match self.read_token() {
            Ok(Some(token)) if !token.is_expired_at(now) => Some(token),
            Ok(Some(_)) => {
                debug!("Cached token expired");
                self.remove_cache_file();
                None
            }
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Discarding unreadable token cache");
                self.remove_cache_file();
                None
            }
        }
    }

    fn save(&mut self, token: &SessionToken) -> Result<(), CacheError> {
        let key = match self.load_or_create_key() {
            Ok(key) => key,
            Err(CacheError::Key(reason)) => {
                warn!(reason = %reason, "Replacing invalid token cache key");
                self.create_key()?
            }
            Err(e) => return Err(e),
        };
        let plaintext = serde_json::to_vec(token)?;
        let data = encrypt(&key, &plaintext)?;
        write_private(&self.cache_path(), &data)
    }

    fn invalidate(&mut self) {
        self.remove_cache_file();
    }
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CacheError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CacheError::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt(key: &[u8; KEY_LEN], data: &[u8]) -> Result<Vec<u8>, CacheError> {
    if data.len() < NONCE_LEN {
        return Err(CacheError::Decrypt);
    }
    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    ChaCha20Poly1305::new(Key::from_slice(key))
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CacheError::Decrypt)
}

/// Write a file readable only by the owner, replacing any previous contents.
fn write_private(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // The open mode only applies to newly created files.
    restrict_permissions(path)?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn token(now: DateTime<Utc>, ttl: Duration) -> SessionToken {
        SessionToken {
            bearer: "secret-bearer".to_string(),
            user_id: 12345,
            issued_at: now,
            expires_at: now + ttl,
            account_start: now - Duration::days(400),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let t = token(now, Duration::hours(24));

        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&t).unwrap();

        // A fresh store instance reads the same files
        let mut reopened = EncryptedFileStore::new(dir.path());
        assert_eq!(reopened.load(now), Some(t));
    }

    #[test]
    fn test_cache_file_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(Utc::now(), Duration::hours(1))).unwrap();

        let raw = fs::read(store.cache_path()).unwrap();
        let needle = b"secret-bearer";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_missing_cache_is_absent() {
        let dir = TempDir::new().unwrap();
        let mut store = EncryptedFileStore::new(dir.path());
        assert!(store.load(Utc::now()).is_none());
    }

    #[test]
    fn test_expired_token_is_removed() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(now, Duration::hours(1))).unwrap();

        assert!(store.load(now + Duration::hours(2)).is_none());
        assert!(!store.cache_path().exists());
    }

    #[test]
    fn test_bit_flip_is_absent() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(now, Duration::hours(1))).unwrap();

        let mut raw = fs::read(store.cache_path()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        fs::write(store.cache_path(), raw).unwrap();

        assert!(store.load(now).is_none());
        assert!(!store.cache_path().exists());
    }

    #[test]
    fn test_replaced_key_is_absent() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(now, Duration::hours(1))).unwrap();

        fs::write(store.key_path(), STANDARD.encode([7u8; KEY_LEN])).unwrap();
        assert!(store.load(now).is_none());
    }

    #[test]
    fn test_garbage_key_and_truncated_cache() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let mut store = EncryptedFileStore::new(dir.path());

        fs::write(store.cache_path(), b"short").unwrap();
        assert!(store.load(now).is_none());

        // An unusable key file is replaced on the next save
        fs::write(store.key_path(), "not base64!").unwrap();
        let t = token(now, Duration::hours(1));
        store.save(&t).unwrap();
        assert_eq!(store.load(now), Some(t));
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(Utc::now(), Duration::hours(1))).unwrap();
        assert!(store.has_cached_token());
        store.invalidate();
        assert!(!store.has_cached_token());
        // Invalidating twice is fine
        store.invalidate();
    }

    #[test]
    fn test_locate_prefers_cache_dir() {
        let dir = TempDir::new().unwrap();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(Utc::now(), Duration::hours(1))).unwrap();

        // A store located from the same directory clears the same file
        let mut located = EncryptedFileStore::locate(Some(dir.path())).unwrap();
        assert_eq!(located.cache_path(), store.cache_path());
        located.invalidate();
        assert!(!store.has_cached_token());
    }

    #[cfg(unix)]
    #[test]
    fn test_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut store = EncryptedFileStore::new(dir.path());
        store.save(&token(Utc::now(), Duration::hours(1))).unwrap();

        for path in [store.key_path(), store.cache_path()] {
            let mode = fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_open_files_are_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut store = EncryptedFileStore::new(dir.path());
        fs::write(store.key_path(), STANDARD.encode([3u8; KEY_LEN])).unwrap();
        fs::write(store.cache_path(), b"stale").unwrap();
        for path in [store.key_path(), store.cache_path()] {
            fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        }

        let now = Utc::now();
        let t = token(now, Duration::hours(1));
        store.save(&t).unwrap();

        for path in [store.key_path(), store.cache_path()] {
            let mode = fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        // The existing key was kept, not regenerated
        assert_eq!(
            fs::read_to_string(store.key_path()).unwrap(),
            STANDARD.encode([3u8; KEY_LEN])
        );
        assert_eq!(store.load(now), Some(t));
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};

use crate::auth::token::UserRecord;
use crate::error::{ClientError, Result};

/// Key holding the bearer token
pub const AUTH_TOKEN_KEY: &str = "floodsense_admin_token";
/// Key holding the optional refresh token
pub const REFRESH_TOKEN_KEY: &str = "floodsense_admin_refresh_token";
/// Key holding the serialized user record
pub const AUTH_USER_KEY: &str = "floodsense_admin_user";

/// Synchronous string key/value storage that outlives a single request
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-lifetime storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| ClientError::storage(key, e))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ClientError::storage(key, e))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ClientError::storage(key, e))?;
        entries.remove(key);
        Ok(())
    }
}

/// Storage persisted as a single JSON object file, written through on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store; a missing or unreadable file opens as empty
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => {
                    debug!(path = %path.display(), keys = entries.len(), "Opened storage file");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Storage file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No storage file yet");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read storage file, starting empty");
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, key: &str, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ClientError::storage(key, e))?;
            }
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|e| ClientError::storage(key, e))?;

        // Write a sibling file and rename it so readers never see a partial file
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, contents).map_err(|e| ClientError::storage(key, e))?;
        fs::rename(&staging, &self.path).map_err(|e| ClientError::storage(key, e))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|e| ClientError::storage(key, e))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| ClientError::storage(key, e))?;
        entries.insert(key.to_string(), value.to_string());
        self.save(key, &entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| ClientError::storage(key, e))?;
        if entries.remove(key).is_some() {
            self.save(key, &entries)?;
        }
        Ok(())
    }
}

/// Holds the session credentials under fixed keys
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    /// Serializes multi-key writes so a save and a clear never interleave
    writes: Arc<Mutex<()>>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Token store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Persist a session, replacing whatever was stored before.
    ///
    /// The token is written last. If any write fails every key is removed, so
    /// a failed save never leaves a token paired with someone else's record.
    pub fn save(&self, token: &str, user: &UserRecord, refresh_token: Option<&str>) -> Result<()> {
        let user_json =
            serde_json::to_string(user).map_err(|e| ClientError::storage(AUTH_USER_KEY, e))?;

        let _writing = self.writes.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = self.write_session(token, &user_json, refresh_token) {
            warn!(error = %e, "Session write failed, removing partial session");
            let _ = self.remove_all();
            return Err(e);
        }

        info!(username = %user.username, "Session stored");
        Ok(())
    }

    /// Remove every session key
    pub fn clear(&self) -> Result<()> {
        let _writing = self.writes.lock().unwrap_or_else(|p| p.into_inner());
        self.remove_all()?;
        debug!("Session cleared from storage");
        Ok(())
    }

    /// Clear the session only while the stored token is still `expected`.
    ///
    /// Returns whether storage was cleared. A session saved since the caller
    /// last looked is left alone.
    pub fn clear_if_token(&self, expected: Option<&str>) -> Result<bool> {
        let _writing = self.writes.lock().unwrap_or_else(|p| p.into_inner());
        if self.get_token().as_deref() != expected {
            debug!("Stored session changed, not clearing it");
            return Ok(false);
        }
        self.remove_all()?;
        debug!("Session cleared from storage");
        Ok(true)
    }

    fn write_session(&self, token: &str, user_json: &str, refresh_token: Option<&str>) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.set(AUTH_USER_KEY, user_json)?;
        match refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.store.remove(REFRESH_TOKEN_KEY)?,
        }
        self.store.set(AUTH_TOKEN_KEY, token)
    }

    fn remove_all(&self) -> Result<()> {
        let mut first_error = None;
        for key in [AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, AUTH_USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn get_token(&self) -> Option<String> {
        self.read(AUTH_TOKEN_KEY).filter(|token| !token.is_empty())
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Stored user; malformed JSON reads as absent
    pub fn get_user(&self) -> Option<UserRecord> {
        let raw = self.read(AUTH_USER_KEY)?;
        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user record is malformed, ignoring it");
                None
            }
        }
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read from storage");
                None
            }
        }
    }
}

//! Persisted session storage.
//!
//! # Design
//! `SessionStore` keeps one JSON-serialized `Session` under a single key of a
//! `KeyValueStore`. Every mutation is written through immediately. A stored
//! value that does not deserialize into a complete `Session` is treated as no
//! session at all.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;

/// Default storage key for the session.
pub const DEFAULT_SESSION_KEY: &str = "user";

/// The authenticated user and their access token.
///
/// `_id`, `username` and `accessToken` are mandatory; a payload missing any of
/// them does not deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// String key-value persistence, the moral equivalent of browser storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), ApiError>;
    fn remove(&mut self, key: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ApiError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ApiError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every `set` / `remove`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(ApiError::Storage(e.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| ApiError::Storage(e.to_string()))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), ApiError> {
        let raw = serde_json::to_string_pretty(entries).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| ApiError::Storage(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ApiError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), ApiError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(storage: S, key: &str) -> Self {
        Self {
            storage,
            key: key.to_string(),
        }
    }

    /// Read the persisted session. Unreadable or partial values load as
    /// `None`.
    pub fn load(&self) -> Option<Session> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "could not read persisted session");
                return None;
            }
        };
        match serde_json::from_str::<Option<Session>>(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding malformed persisted session");
                None
            }
        }
    }

    pub fn save(&mut self, session: &Session) -> Result<(), ApiError> {
        let raw = serde_json::to_string(session).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.storage.set(&self.key, raw)
    }

    pub fn clear(&mut self) -> Result<(), ApiError> {
        self.storage.remove(&self.key)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

//! Stored Identity: the client-side key-value store
//!
//! Plays the part of site-wide cookies. Values live in memory and, when a
//! backing file is configured, are mirrored to it as JSON after every write so
//! they survive a restart of the client.

use std::{
    collections::BTreeMap,
    fmt,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Keys held in Stored Identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityKey {
    Player,
    PreviousPlayer,
    AccessToken,
    RefreshToken,
    PauseTime,
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentityKey::Player => "Player",
            IdentityKey::PreviousPlayer => "PreviousPlayer",
            IdentityKey::AccessToken => "AccessToken",
            IdentityKey::RefreshToken => "RefreshToken",
            IdentityKey::PauseTime => "PauseTime",
        };
        f.write_str(name)
    }
}

/// Shared key-value store. Writes are last-write-wins.
#[derive(Debug, Default)]
pub struct IdentityStore {
    values: Mutex<BTreeMap<IdentityKey, String>>,
    path: Option<PathBuf>,
}

impl IdentityStore {
    /// Create an empty store that lives only in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store mirrored to `path`.
    ///
    /// A missing file starts an empty store. An unreadable one is logged and
    /// also starts empty; it is overwritten on the next write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring unreadable identity file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read identity file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        debug!("Opened identity store at {} with {} keys", path.display(), values.len());
        Self {
            values: Mutex::new(values),
            path: Some(path),
        }
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: IdentityKey) -> Option<String> {
        self.lock().get(&key).cloned()
    }

    /// Whether a value is stored under `key`
    pub fn contains(&self, key: IdentityKey) -> bool {
        self.lock().contains_key(&key)
    }

    /// Store `value` under `key`
    pub fn set(&self, key: IdentityKey, value: impl Into<String>) {
        let mut values = self.lock();
        values.insert(key, value.into());
        self.persist(&values);
    }

    /// Remove `key`
    pub fn remove(&self, key: IdentityKey) {
        let mut values = self.lock();
        if values.remove(&key).is_some() {
            self.persist(&values);
        }
    }

    /// Read the pause marker as a timestamp.
    ///
    /// A marker that does not parse is reported as a storage error rather
    /// than silently dropped.
    pub fn pause_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.get(IdentityKey::PauseTime)
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| ClientError::Storage(format!("invalid PauseTime {:?}: {}", raw, e)))
            })
            .transpose()
    }

    /// Stamp the pause marker with `at`
    pub fn set_pause_time(&self, at: DateTime<Utc>) {
        self.set(IdentityKey::PauseTime, at.to_rfc3339());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<IdentityKey, String>> {
        // Values are plain strings, a poisoned guard still holds a usable map
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, values: &BTreeMap<IdentityKey, String>) {
        let Some(path) = &self.path else {
            return;
        };

        let written = serde_json::to_string_pretty(values)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));

        if let Err(e) = written {
            warn!("Failed to write identity file {}: {}", path.display(), e);
        }
    }
}

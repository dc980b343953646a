//! Token persistence contract and built-in stores.
//!
//! The persisted credential triple is loaded and saved as one unit —
//! partial writes would leave an unusable half-credential state, so both
//! implementations serialize access through a lock. Saving the cleared
//! triple represents explicit invalidation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::Error;

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// The persisted credential triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredTokens {
    /// The all-`None` triple used for explicit invalidation.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.expires_at.is_none()
    }
}

/// Durable persistence for the token triple.
///
/// Consulted once at startup and updated on every token change.
/// Implementations must make `load`/`save` atomic with respect to
/// concurrent callers.
pub trait TokenStore: Send + Sync {
    /// Load the persisted triple; a store with no record returns the
    /// cleared triple.
    fn load(&self) -> StoreFuture<'_, StoredTokens>;

    /// Persist the triple, replacing whatever was stored before.
    fn save(&self, tokens: StoredTokens) -> StoreFuture<'_, ()>;
}

// ── In-memory store ──────────────────────────────────────────────────

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out with a known triple already "persisted".
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            inner: Mutex::new(tokens),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StoreFuture<'_, StoredTokens> {
        Box::pin(async { Ok(self.inner.lock().await.clone()) })
    }

    fn save(&self, tokens: StoredTokens) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            *self.inner.lock().await = tokens;
            Ok(())
        })
    }
}

// ── File-backed store ────────────────────────────────────────────────

/// Persists the triple to a JSON file, surviving process restarts.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place,
/// so a crash mid-save never leaves a torn record on disk.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Result<StoredTokens, Error> {
        if !path.exists() {
            return Ok(StoredTokens::cleared());
        }
        let bytes = std::fs::read(path).map_err(|e| Error::Store {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        if bytes.is_empty() {
            return Ok(StoredTokens::cleared());
        }
        serde_json::from_slice(&bytes).map_err(|e| Error::Store {
            message: format!("failed to parse {}: {e}", path.display()),
        })
    }

    fn write_file(path: &Path, tokens: &StoredTokens) -> Result<(), Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::Store {
                message: format!("failed to create {}: {e}", parent.display()),
            })?;
        }

        let serialized = serde_json::to_vec_pretty(tokens).map_err(|e| Error::Store {
            message: format!("failed to serialize tokens: {e}"),
        })?;

        let mut tmp_path = path.to_path_buf();
        tmp_path.set_extension("tmp");
        std::fs::write(&tmp_path, &serialized).map_err(|e| Error::Store {
            message: format!("failed to write {}: {e}", tmp_path.display()),
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| Error::Store {
            message: format!("failed to replace {}: {e}", path.display()),
        })
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> StoreFuture<'_, StoredTokens> {
        Box::pin(async {
            let _guard = self.lock.lock().await;
            Self::read_file(&self.path)
        })
    }

    fn save(&self, tokens: StoredTokens) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Self::write_file(&self.path, &tokens)
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────

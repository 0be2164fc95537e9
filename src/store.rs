//! Durable storage of the key record set.
//!
//! The store hands out and accepts the *whole* collection: there is no per-record
//! API and no cache between calls, so every lifecycle operation sees the latest
//! persisted state. Serializing concurrent writers is the caller's job
//! (see [`crate::services::key_service::KeyService`]).

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::license_key::{KeyRecord, KeyStoreDocument};

/// Persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document could not be parsed.
    #[error("corrupt key store: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The record set could not be encoded.
    #[error("failed to encode key store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Whole-collection read/write of key records.
pub trait KeyStore: Send + Sync {
    /// Return every record in issuance order.
    fn load(&self) -> impl Future<Output = Result<Vec<KeyRecord>, StoreError>> + Send;

    /// Replace the persisted set with `records`. Durable once this returns.
    fn save(&self, records: &[KeyRecord]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Create an empty store if none exists. No-op otherwise.
    fn initialize_if_absent(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Key store backed by a single JSON document on disk.
///
/// # Format
///
/// ```json
/// { "keys": [ { "key": "...", "createdAt": "...", ... } ] }
/// ```
///
/// # Fail-open
///
/// With `fail_open` set, a corrupt or unreadable file loads as an empty set
/// (logged at warn level) so a damaged store cannot take the service down.
/// Callers then cannot tell "empty" from "corrupt". With `fail_open` unset the
/// failure is returned as [`StoreError::Corrupt`] or [`StoreError::Io`].
/// A missing file is always an empty set.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    fail_open: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, fail_open: bool) -> Self {
        Self {
            path: path.into(),
            fail_open,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "keys.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn recover<E: std::fmt::Display>(&self, err: E, what: &str) -> Vec<KeyRecord> {
        tracing::warn!(
            path = %self.path.display(),
            "Key store {}, treating as empty: {}",
            what,
            err
        );
        Vec::new()
    }
}

impl KeyStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<KeyRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) if self.fail_open => return Ok(self.recover(e, "unreadable")),
            Err(e) => return Err(StoreError::Io(e)),
        };

        match serde_json::from_slice::<KeyStoreDocument>(&bytes) {
            Ok(document) => Ok(document.keys),
            Err(e) if self.fail_open => Ok(self.recover(e, "corrupt")),
            Err(e) => Err(StoreError::Corrupt(e)),
        }
    }

    async fn save(&self, records: &[KeyRecord]) -> Result<(), StoreError> {
        let document = KeyStoreDocument {
            keys: records.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&document).map_err(StoreError::Encode)?;

        // Write a sibling file, flush it to disk, then swap it in so readers
        // never see a half-written document.
        let temp = self.temp_path();
        if let Err(e) = write_and_swap(&temp, &self.path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), "Failed to remove temp file: {}", cleanup);
                }
            }
            return Err(StoreError::Io(e));
        }

        // The rename only survives a crash once the directory entry is on disk.
        sync_dir(self.path.parent()).await?;
        Ok(())
    }

    async fn initialize_if_absent(&self) -> Result<(), StoreError> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.save(&[]).await?;
        tracing::info!(path = %self.path.display(), "Created empty key store");
        Ok(())
    }
}

async fn write_and_swap(temp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(temp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(temp, target).await
}

#[cfg(unix)]
async fn sync_dir(dir: Option<&Path>) -> std::io::Result<()> {
    let dir = match dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    tokio::fs::File::open(dir).await?.sync_all().await
}

// Directories cannot be opened as files here; NTFS journals the rename itself.
#[cfg(not(unix))]
async fn sync_dir(_dir: Option<&Path>) -> std::io::Result<()> {
    Ok(())
}

/// In-memory key store, used as a test double.
///
/// `load` yields to the scheduler before returning so that unsynchronized
/// read-modify-write sequences interleave the way they would against a file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<KeyRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<KeyRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of the current contents, bypassing the trait.
    pub async fn snapshot(&self) -> Vec<KeyRecord> {
        self.records.lock().await.clone()
    }
}

impl KeyStore for MemoryStore {
    async fn load(&self) -> Result<Vec<KeyRecord>, StoreError> {
        let records = self.records.lock().await.clone();
        tokio::task::yield_now().await;
        Ok(records)
    }

    async fn save(&self, records: &[KeyRecord]) -> Result<(), StoreError> {
        *self.records.lock().await = records.to_vec();
        Ok(())
    }

    async fn initialize_if_absent(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

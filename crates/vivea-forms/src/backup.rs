//! Local backup log of submission attempts
//!
//! Append-only: each attempt adds one `pending_sync` record, whatever the
//! chain outcome. Nothing replays these records; they are an audit trail and
//! the last resort when every remote stage failed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use vivea_api::TrackingRecord;
use vivea_core::PersistenceError;

#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn append(&self, record: &TrackingRecord) -> Result<(), PersistenceError>;

    async fn load(&self) -> Result<Vec<TrackingRecord>, PersistenceError>;

    /// Every stored record, or an empty list when the store cannot be read
    async fn pending(&self) -> Vec<TrackingRecord> {
        match self.load().await {
            Ok(records) => records,
            Err(e) => {
                warn!("[BackupStore] Could not read backup, reporting none: {}", e);
                Vec::new()
            }
        }
    }
}

/// JSON array on disk, rewritten through a temp file on each append
pub struct JsonFileBackup {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> Result<Vec<TrackingRecord>, PersistenceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl BackupStore for JsonFileBackup {
    async fn append(&self, record: &TrackingRecord) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        records.push(record.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            "[JsonFileBackup] Stored {} in {} ({} records)",
            record.id,
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    async fn load(&self) -> Result<Vec<TrackingRecord>, PersistenceError> {
        self.read_records().await
    }
}

/// Process-local store, for tests and embedding
#[derive(Default)]
pub struct MemoryBackup {
    records: Mutex<Vec<TrackingRecord>>,
}

impl MemoryBackup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TrackingRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl BackupStore for MemoryBackup {
    async fn append(&self, record: &TrackingRecord) -> Result<(), PersistenceError> {
        self.records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("backup lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<TrackingRecord>, PersistenceError> {
        Ok(self.records())
    }
}

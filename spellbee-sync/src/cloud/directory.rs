//! Directory-backed cloud store.
//!
//! Uses a synced container folder (such as an iCloud Drive container mounted
//! on disk), one JSON file per record. The store is "signed in" when the
//! container directory exists.

use super::record::{CloudRecord, RecordId};
use super::store::CloudStore;
use crate::config::CloudConfig;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub struct DirectoryCloudStore {
    config: CloudConfig,
}

impl DirectoryCloudStore {
    pub fn new(config: CloudConfig) -> Self {
        Self { config }
    }

    /// Store rooted at `container`.
    pub fn at(container: impl Into<PathBuf>) -> Self {
        Self::new(CloudConfig {
            container_path: Some(container.into()),
            ..CloudConfig::default()
        })
    }

    fn container(&self) -> SyncResult<&Path> {
        let path = self
            .config
            .container_path
            .as_deref()
            .ok_or_else(|| SyncError::NotAuthenticated("no cloud container configured".into()))?;
        if !path.is_dir() {
            return Err(SyncError::NotAuthenticated(format!(
                "cloud container not found at {}",
                path.display()
            )));
        }
        Ok(path)
    }

    /// The folder holding records of the configured type.
    async fn records_dir(&self) -> SyncResult<PathBuf> {
        let dir = self.container()?.join(&self.config.record_type);
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| SyncError::CloudStorage(format!("failed to create record folder: {e}")))?;
            debug!("Created cloud record folder: {:?}", dir);
        }
        Ok(dir)
    }

    async fn record_path(&self, id: &RecordId) -> SyncResult<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(SyncError::CloudStorage(format!("invalid record id: {id}")));
        }
        Ok(self.records_dir().await?.join(format!("{id}.json")))
    }
}

#[async_trait]
impl CloudStore for DirectoryCloudStore {
    fn provider_name(&self) -> &'static str {
        "Directory"
    }

    async fn is_available(&self) -> bool {
        self.container().is_ok()
    }

    async fn fetch(&self, id: &RecordId) -> SyncResult<CloudRecord> {
        let path = self.record_path(id).await?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::RecordNotFound(id.to_string()));
            }
            Err(e) => return Err(SyncError::CloudStorage(format!("failed to read record: {e}"))),
        };
        serde_json::from_slice(&bytes).map_err(|e| SyncError::DecodingFailed(e.to_string()))
    }

    async fn save(&self, record: &CloudRecord) -> SyncResult<()> {
        let path = self.record_path(&record.record_id).await?;
        let bytes =
            serde_json::to_vec_pretty(record).map_err(|e| SyncError::EncodingFailed(e.to_string()))?;

        // Readers never see a half-written record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| SyncError::CloudStorage(format!("failed to write record: {e}")))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| SyncError::CloudStorage(format!("failed to commit record: {e}")))?;

        debug!("Saved cloud record {} ({} bytes)", record.record_id, bytes.len());
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> SyncResult<()> {
        let path = self.record_path(id).await?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SyncError::RecordNotFound(id.to_string()))
            }
            Err(e) => Err(SyncError::CloudStorage(format!("failed to delete record: {e}"))),
        }
    }
}

//! Cloud store abstraction.

use super::record::{CloudRecord, RecordId};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A store of cloud records.
#[async_trait]
pub trait CloudStore: Send + Sync {
    /// Returns the name of the backing provider.
    fn provider_name(&self) -> &'static str;

    /// Returns whether the account is signed in and the store reachable.
    async fn is_available(&self) -> bool;

    /// Fetches a record. A missing record is `SyncError::RecordNotFound`.
    async fn fetch(&self, id: &RecordId) -> SyncResult<CloudRecord>;

    /// Creates or replaces the record with the same id.
    async fn save(&self, record: &CloudRecord) -> SyncResult<()>;

    async fn delete(&self, id: &RecordId) -> SyncResult<()>;
}

/// In-memory cloud store with an availability switch.
#[derive(Debug)]
pub struct MemoryCloudStore {
    records: RwLock<HashMap<RecordId, CloudRecord>>,
    available: AtomicBool,
}

impl Default for MemoryCloudStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCloudStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates losing or regaining connectivity.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self) -> SyncResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::NetworkUnavailable)
        }
    }
}

#[async_trait]
impl CloudStore for MemoryCloudStore {
    fn provider_name(&self) -> &'static str {
        "Memory"
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn fetch(&self, id: &RecordId) -> SyncResult<CloudRecord> {
        self.check_available()?;
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::RecordNotFound(id.to_string()))
    }

    async fn save(&self, record: &CloudRecord) -> SyncResult<()> {
        self.check_available()?;
        self.records
            .write()
            .await
            .insert(record.record_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> SyncResult<()> {
        self.check_available()?;
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SyncError::RecordNotFound(id.to_string()))
    }
}

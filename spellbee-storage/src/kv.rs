//! Key-value backend abstraction.

use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// A single mutation in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or overwrite a key.
    Put { key: String, value: Vec<u8> },
    /// Remove a key (absent keys are fine).
    Delete { key: String },
}

impl WriteOp {
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }
}

/// Durable byte storage keyed by string.
///
/// [`apply`](KeyValueStore::apply) must be atomic: readers see either none of
/// a batch or all of it.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Applies a batch of writes atomically.
    fn apply(&self, ops: &[WriteOp]) -> StorageResult<()>;

    /// Writes a single value.
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.apply(&[WriteOp::put(key, value)])
    }

    /// Removes a single value.
    fn remove(&self, key: &str) -> StorageResult<()> {
        self.apply(&[WriteOp::delete(key)])
    }
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, ops: &[WriteOp]) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockPoisoned)?;
        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                WriteOp::Delete { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

//! Local persistence for a device's profile replica.
//!
//! Each device owns exactly one [`LocalStore`]. It keeps the replica, the
//! pending-sync flag, the last-sync stamp, and the cloud record id in a
//! [`KeyValueStore`], and migrates profiles written by older builds the first
//! time [`LocalStore::load`] finds nothing under the current key.
//!
//! # Backends
//!
//! - [`SqliteKeyValueStore`]: a single `kv` table; batches run in one
//!   transaction
//! - [`MemoryKeyValueStore`]: a mutex-guarded map for tests and simulation

mod config;
mod error;
mod kv;
mod local_store;
mod sqlite;

pub use config::{StoreConfig, keys};
pub use error::{StorageError, StorageResult};
pub use kv::{KeyValueStore, MemoryKeyValueStore, WriteOp};
pub use local_store::LocalStore;
pub use sqlite::SqliteKeyValueStore;

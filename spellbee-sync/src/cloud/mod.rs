//! The optional cloud replica.
//!
//! The cloud holds a third copy of the profile as a structured record. It is
//! reconciled with the local replica by the same last-writer-wins merge used
//! between paired devices.

mod directory;
mod record;
mod reconcile;
mod store;

pub use directory::DirectoryCloudStore;
pub use reconcile::{CloudReconciler, ReconcileOutcome};
pub use record::{CloudRecord, FieldValue, RecordId, RemoteReplicaAdapter, fields};
pub use store::{CloudStore, MemoryCloudStore};

/// Record type name for profile records.
pub const PROFILE_RECORD_TYPE: &str = "UserProfile";

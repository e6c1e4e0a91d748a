//! Store configuration and key names.

use serde::{Deserialize, Serialize};

/// Keys used in the device key-value store.
pub mod keys {
    /// Encoded replicated profile.
    pub const PROFILE: &str = "syncableProfile";
    /// Pending-sync flag.
    pub const PENDING_SYNC: &str = "pendingSync";
    /// Millisecond stamp of the last completed sync.
    pub const LAST_SYNC: &str = "lastSyncDate";
    /// Identifier of the cloud replica record.
    pub const REMOTE_RECORD_ID: &str = "cloudRecordID";

    /// Single-grade profile written by the old phone build.
    pub const LEGACY_PHONE: &str = "userProfile_iOS";
    /// Single-grade profile written by the old watch build.
    pub const LEGACY_WATCH: &str = "user_profile";

    /// Every key owned by the current scheme; removed together on reset.
    pub const ALL: [&str; 4] = [PROFILE, PENDING_SYNC, LAST_SYNC, REMOTE_RECORD_ID];
}

/// Configuration for a [`LocalStore`](crate::LocalStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Legacy keys consulted by migration, in priority order.
    pub legacy_keys: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            legacy_keys: vec![keys::LEGACY_PHONE.to_string(), keys::LEGACY_WATCH.to_string()],
        }
    }
}

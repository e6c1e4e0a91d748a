//! Sync configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Device name for log lines.
    pub device_name: String,
    /// Push our replica back to the peer when it wins a pull.
    pub push_back_on_win: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            device_name: "Spelling Bee Device".to_string(),
            push_back_on_win: true,
        }
    }
}

/// Configuration for the cloud replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Container directory for the directory-backed store.
    pub container_path: Option<PathBuf>,
    /// Record type name for profile records.
    pub record_type: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            container_path: None,
            record_type: crate::cloud::PROFILE_RECORD_TYPE.to_string(),
        }
    }
}

//! Observable sync status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a device is in its sync cycle.
///
/// `Success` and `Error` are resting states: the next trigger starts over, so
/// a failure never blocks later attempts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Success,
    /// Transport failure, with a human-readable description.
    Error(String),
}

impl SyncStatus {
    /// Whether a pull is outstanding.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Syncing => f.write_str("syncing"),
            Self::Success => f.write_str("success"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

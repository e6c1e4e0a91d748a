//! Core type definitions for spelling-bee profile replication.
//!
//! This crate defines the plain data shared by every replica:
//! - [`ProfileRecord`], the per-grade progress record, and the
//!   [`LegacyProfile`] single-grade shape it replaced
//! - [`Timestamp`], the wall-clock stamp used for last-writer-wins ordering
//! - [`DeviceId`], the provenance identifier of the writing device
//!
//! Nothing here knows about replication metadata or transports; those live in
//! `spellbee-replica` and `spellbee-sync`.

mod ids;
mod profile;
mod timestamp;

pub use ids::DeviceId;
pub use profile::{
    LegacyProfile, ProfileRecord, StoredProfile, MAX_GRADE, MAX_LEVEL, MIN_GRADE, MIN_LEVEL,
    clamp_grade, grades,
};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid device identifier: {0}")]
    InvalidDeviceId(String),
}

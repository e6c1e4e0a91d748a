//! Error types for the sync layer.

use spellbee_replica::CodecError;
use spellbee_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// None of these are fatal to the app: the local replica stays usable.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The cloud account is not signed in or the container is missing.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// The cloud store cannot be reached.
    #[error("network unavailable")]
    NetworkUnavailable,

    /// The requested cloud record does not exist.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Reserved. Merge always resolves, so this is never raised.
    #[error("conflict detected")]
    ConflictDetected,

    /// A replica or record could not be encoded.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// A replica or record could not be decoded.
    #[error("decoding failed: {0}")]
    DecodingFailed(String),

    /// Transport failure with an unclassified cause.
    #[error("{0}")]
    Unknown(String),

    /// The peer link is down or refused the message.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed envelope.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Cloud container I/O failure.
    #[error("cloud storage error: {0}")]
    CloudStorage(String),

    /// The other end of a channel went away.
    #[error("channel closed")]
    ChannelClosed,

    /// Local store fault.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CodecError> for SyncError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encode(e) => Self::EncodingFailed(e.to_string()),
            CodecError::Decode(e) => Self::DecodingFailed(e.to_string()),
        }
    }
}

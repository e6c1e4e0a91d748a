//! Byte encoding for replicas.
//!
//! The same JSON form is used for the local store, peer message payloads, and
//! blobs handed to the cloud adapter.

use crate::ReplicatedProfile;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from encoding or decoding a replica.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes are not a valid replica.
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encodes a replica to bytes.
pub fn encode(profile: &ReplicatedProfile) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(profile).map_err(CodecError::Encode)
}

/// Decodes a replica from bytes. The record is normalized on the way in.
pub fn decode(bytes: &[u8]) -> CodecResult<ReplicatedProfile> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

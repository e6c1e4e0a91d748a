//! Replication metadata and conflict resolution for learner profiles.
//!
//! - [`ReplicatedProfile`] wraps a [`ProfileRecord`](spellbee_types::ProfileRecord)
//!   with its last-modified stamp, writing device, and schema version
//! - [`merge`] is the last-writer-wins rule every replica applies
//! - [`encode`] / [`decode`] produce the byte form used for storage, peer
//!   messages, and cloud blobs
//!
//! The merge rule satisfies:
//! - **Commutative**: merge(a, b) == merge(b, a)
//! - **Associative**: merge(merge(a, b), c) == merge(a, merge(b, c))
//! - **Idempotent**: merge(a, a) == a
//!
//! It is not a CRDT. Whichever replica loses is dropped whole, including any
//! levels it completed that the winner never saw.

mod codec;
mod replicated;

pub use codec::{CodecError, CodecResult, decode, encode};
pub use replicated::{CURRENT_SCHEMA_VERSION, ReplicatedProfile, merge};

//! Profile sync between a phone and its paired watch, plus an optional cloud
//! replica.
//!
//! # Architecture
//!
//! Each device holds one replica of the learner's profile in a
//! [`LocalStore`](spellbee_storage::LocalStore). Replicas converge through a
//! last-writer-wins merge; there is no causality tracking.
//!
//! ## Components
//!
//! - **Protocol**: the string-keyed envelopes exchanged between devices
//! - **Transport**: the [`PeerChannel`] abstraction over the paired-device link
//! - **Engine**: [`SyncEngine`], the state machine applying merges, without I/O
//! - **Orchestrator**: [`SyncOrchestrator`], the per-device serialized event
//!   loop that drives the engine and the channel
//! - **Cloud**: [`cloud::RemoteReplicaAdapter`] and the cloud record stores
//!
//! ## Pull
//!
//! 1. The requesting device sends `requestProfile`
//! 2. The peer replies with its encoded replica or `noProfile`
//! 3. The requester merges and persists; if its own copy won, it pushes the
//!    copy back so the peer converges too
//!
//! # Example
//!
//! ```
//! use spellbee_storage::{LocalStore, MemoryKeyValueStore};
//! use spellbee_sync::{SyncConfig, SyncEngine, SyncStatus};
//! use spellbee_types::DeviceId;
//! use std::sync::Arc;
//!
//! let store = LocalStore::new(Arc::new(MemoryKeyValueStore::new()), DeviceId::new("watch"));
//! let engine = SyncEngine::new(store, SyncConfig::default());
//! assert_eq!(engine.status(), &SyncStatus::Idle);
//! ```

pub mod cloud;
mod config;
mod engine;
mod error;
mod orchestrator;
pub mod protocol;
mod state;
pub mod transport;

pub use config::{CloudConfig, SyncConfig};
pub use engine::{IncomingOutcome, PullOutcome, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use orchestrator::{
    OrchestratorHandle, SyncCommand, SyncEvent, SyncOrchestrator, create_orchestrator,
};
pub use protocol::{Action, Envelope, EnvelopeValue, PeerMessage, PeerReply};
pub use state::SyncStatus;
pub use transport::{IncomingMessage, PeerChannel, ReplyHandle};

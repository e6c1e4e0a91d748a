//! Sync engine: profile replication logic without I/O.
//!
//! The engine is a pure state machine. It produces and consumes
//! [`PeerMessage`]s and [`PeerReply`]s against the device's [`LocalStore`].
//! The orchestrator handles all I/O (sending/receiving via the channel).

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{PeerMessage, PeerReply};
use crate::state::SyncStatus;
use spellbee_replica::{ReplicatedProfile, encode, merge};
use spellbee_storage::LocalStore;
use spellbee_types::DeviceId;
use tracing::{debug, info, warn};

/// What the orchestrator should do after a pull reply was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Push the local replica back so the peer converges.
    pub push_back: bool,
    /// The stored replica after the pull, when it differs from before.
    pub profile_changed: Option<ReplicatedProfile>,
}

/// Result of handling an unsolicited peer message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingOutcome {
    /// Reply to send when the message was a request.
    pub reply: Option<PeerReply>,
    /// The stored replica after the message, when it differs from before.
    pub profile_changed: Option<ReplicatedProfile>,
}

/// The sync engine. One per device.
pub struct SyncEngine {
    store: LocalStore,
    config: SyncConfig,
    status: SyncStatus,
}

impl SyncEngine {
    pub fn new(store: LocalStore, config: SyncConfig) -> Self {
        Self {
            store,
            config,
            status: SyncStatus::Idle,
        }
    }

    /// The current sync status.
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn device_id(&self) -> &DeviceId {
        self.store.device_id()
    }

    pub fn device_name(&self) -> &str {
        &self.config.device_name
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The local store this engine replicates.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    // ── Pull ─────────────────────────────────────────────────────

    /// Starts a pull if the peer is reachable.
    ///
    /// An unreachable peer is not a failure: the status settles on `Idle`.
    /// Returns `None` while a pull is already in flight.
    pub fn begin_sync(&mut self, reachable: bool) -> Option<PeerMessage> {
        if self.status.is_syncing() {
            debug!("Sync already in progress, ignoring trigger");
            return None;
        }
        if !reachable {
            debug!("Peer not reachable, deferring sync");
            self.set_status(SyncStatus::Idle);
            return None;
        }
        self.set_status(SyncStatus::Syncing);
        Some(PeerMessage::request_profile())
    }

    /// Applies the peer's reply to a pull request.
    pub fn handle_pull_reply(&mut self, reply: PeerReply) -> PullOutcome {
        match self.apply_pull_reply(reply) {
            Ok(Some(outcome)) => {
                self.set_status(SyncStatus::Success);
                outcome
            }
            Ok(None) => {
                self.set_status(SyncStatus::Idle);
                PullOutcome::default()
            }
            Err(e) => {
                warn!("Failed to apply pull reply: {}", e);
                self.set_status(SyncStatus::Error(e.to_string()));
                PullOutcome::default()
            }
        }
    }

    /// Records a transport failure of the outstanding pull.
    pub fn handle_pull_failure(&mut self, error: &SyncError) {
        warn!("Pull from peer failed: {}", error);
        self.set_status(SyncStatus::Error(error.to_string()));
    }

    /// `Ok(None)` means the reply could not be used and no sync happened.
    fn apply_pull_reply(&mut self, reply: PeerReply) -> SyncResult<Option<PullOutcome>> {
        let local = self.store.load()?;

        let outcome = match reply {
            PeerReply::Profile(bytes) => {
                let remote = match spellbee_replica::decode(&bytes) {
                    Ok(remote) => remote,
                    Err(e) => {
                        warn!("Ignoring undecodable profile from peer: {}", e);
                        return Ok(None);
                    }
                };
                match local {
                    Some(local) => {
                        let merged = merge(&local, &remote);
                        self.store.save(&merged)?;
                        let local_won = merged == local;
                        info!(
                            "Merged peer profile: {} copy kept (local={}, remote={})",
                            if local_won { "local" } else { "remote" },
                            local.last_modified(),
                            remote.last_modified()
                        );
                        PullOutcome {
                            push_back: local_won && self.config.push_back_on_win,
                            profile_changed: (!local_won).then_some(merged),
                        }
                    }
                    None => {
                        info!("Adopting peer profile, no local copy");
                        self.store.save(&remote)?;
                        PullOutcome {
                            push_back: false,
                            profile_changed: Some(remote),
                        }
                    }
                }
            }
            PeerReply::NoProfile => match local {
                Some(_) => {
                    debug!("Peer has no profile, pushing ours");
                    PullOutcome {
                        push_back: true,
                        profile_changed: None,
                    }
                }
                None => {
                    debug!("Neither device has a profile");
                    return Ok(Some(PullOutcome::default()));
                }
            },
            PeerReply::Unrecognized => {
                warn!("Peer reply carried neither a profile nor noProfile");
                return Ok(None);
            }
        };

        // With a push-back outstanding the orchestrator clears the flag once
        // the push has been delivered.
        if !outcome.push_back {
            self.store.clear_pending_sync()?;
        }
        Ok(Some(outcome))
    }

    // ── Inbound ──────────────────────────────────────────────────

    /// Handles a message the peer sent on its own initiative.
    pub fn handle_incoming(&mut self, message: &PeerMessage) -> IncomingOutcome {
        if message.action.is_request() {
            return IncomingOutcome {
                reply: self.answer_request(),
                profile_changed: None,
            };
        }

        let remote = match message.decode_profile() {
            Ok(remote) => remote,
            Err(e) => {
                warn!("Ignoring malformed {} from peer: {}", message.action, e);
                return IncomingOutcome::default();
            }
        };
        match self.apply_update(remote) {
            Ok(profile_changed) => IncomingOutcome {
                reply: None,
                profile_changed,
            },
            Err(e) => {
                warn!("Failed to apply profile update from peer: {}", e);
                IncomingOutcome::default()
            }
        }
    }

    /// A replica that cannot be encoded is answered as no data. `None` when
    /// the local store cannot be read; the requester sees the reply handle
    /// dropped.
    fn answer_request(&self) -> Option<PeerReply> {
        match self.store.load() {
            Ok(Some(local)) => match encode(&local) {
                Ok(bytes) => Some(PeerReply::Profile(bytes)),
                Err(e) => {
                    warn!("Failed to encode local profile for peer: {}", e);
                    Some(PeerReply::NoProfile)
                }
            },
            Ok(None) => Some(PeerReply::NoProfile),
            Err(e) => {
                warn!("Failed to load local profile for peer: {}", e);
                None
            }
        }
    }

    fn apply_update(&mut self, remote: ReplicatedProfile) -> SyncResult<Option<ReplicatedProfile>> {
        let Some(local) = self.store.load()? else {
            info!("Adopting pushed profile from {}", remote.device_identifier());
            self.store.save(&remote)?;
            return Ok(Some(remote));
        };

        let merged = merge(&local, &remote);
        if merged == local {
            debug!("Pushed profile is not newer, keeping local copy");
            return Ok(None);
        }
        info!(
            "Applied pushed profile from {} (lastModified={})",
            merged.device_identifier(),
            merged.last_modified()
        );
        self.store.save(&merged)?;
        Ok(Some(merged))
    }

    // ── Push ─────────────────────────────────────────────────────

    /// Produces a `profileUpdated` message carrying the local replica.
    pub fn make_push(&self) -> Option<PeerMessage> {
        let local = match self.store.load() {
            Ok(Some(local)) => local,
            Ok(None) => {
                debug!("Nothing to push, no local profile");
                return None;
            }
            Err(e) => {
                warn!("Failed to load local profile for push: {}", e);
                return None;
            }
        };
        match encode(&local) {
            Ok(bytes) => Some(PeerMessage::profile_updated(bytes)),
            Err(e) => {
                warn!("Failed to encode local profile for push: {}", e);
                None
            }
        }
    }

    fn set_status(&mut self, status: SyncStatus) {
        if self.status != status {
            debug!("Sync status {} -> {}", self.status, status);
            self.status = status;
        }
    }
}

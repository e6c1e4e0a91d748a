//! Per-device sync event loop.
//!
//! Everything that touches the engine runs on one task, one event at a time:
//! user commands, completed pulls, and inbound peer messages. The pull
//! request itself is awaited on a spawned task and its result re-enters the
//! same queue, so the loop keeps serving the peer while a pull is in flight.

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{Envelope, PeerMessage, PeerReply};
use crate::state::SyncStatus;
use crate::transport::{IncomingMessage, PeerChannel};
use spellbee_replica::ReplicatedProfile;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Commands accepted by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Foreground or activation event: pull from the peer.
    Trigger,
    /// Local change: push our replica to the peer.
    Push,
    Shutdown,
}

/// Events observed by the UI, emitted in loop order.
///
/// Delivered on an unbounded stream that the owner must keep draining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    StatusChanged(SyncStatus),
    /// The stored replica was replaced by sync.
    ProfileChanged(ReplicatedProfile),
}

enum Inbox {
    Command(SyncCommand),
    PullCompleted(SyncResult<Envelope>),
}

/// Cloneable handle for driving a running orchestrator.
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::UnboundedSender<Inbox>,
    status: watch::Receiver<SyncStatus>,
}

impl OrchestratorHandle {
    /// Requests a pull from the peer.
    pub fn trigger_sync(&self) -> SyncResult<()> {
        self.send(SyncCommand::Trigger)
    }

    /// Requests a push of the local replica.
    pub fn push_local_changes(&self) -> SyncResult<()> {
        self.send(SyncCommand::Push)
    }

    pub fn shutdown(&self) -> SyncResult<()> {
        self.send(SyncCommand::Shutdown)
    }

    /// The latest published status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Waits until the published status satisfies `pred`.
    pub async fn wait_for_status(
        &self,
        pred: impl FnMut(&SyncStatus) -> bool,
    ) -> SyncResult<SyncStatus> {
        let mut status = self.status.clone();
        status
            .wait_for(pred)
            .await
            .map(|found| found.clone())
            .map_err(|_| SyncError::ChannelClosed)
    }

    fn send(&self, command: SyncCommand) -> SyncResult<()> {
        self.tx
            .send(Inbox::Command(command))
            .map_err(|_| SyncError::ChannelClosed)
    }
}

/// The event loop for one device.
pub struct SyncOrchestrator {
    engine: SyncEngine,
    channel: Arc<dyn PeerChannel>,
    inbox: mpsc::UnboundedReceiver<Inbox>,
    /// Weak so the loop ends once every handle is dropped.
    requeue: mpsc::WeakUnboundedSender<Inbox>,
    events: mpsc::UnboundedSender<SyncEvent>,
    status: watch::Sender<SyncStatus>,
}

/// Creates an orchestrator, its handle and its event stream.
///
/// The event stream is unbounded: drain it, or drop the receiver if events
/// are not needed. The loop keeps running without a receiver.
pub fn create_orchestrator(
    engine: SyncEngine,
    channel: Arc<dyn PeerChannel>,
) -> (
    OrchestratorHandle,
    mpsc::UnboundedReceiver<SyncEvent>,
    SyncOrchestrator,
) {
    let (tx, inbox) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(engine.status().clone());

    let orchestrator = SyncOrchestrator {
        engine,
        channel,
        inbox,
        requeue: tx.downgrade(),
        events: event_tx,
        status: status_tx,
    };
    let handle = OrchestratorHandle {
        tx,
        status: status_rx,
    };
    (handle, event_rx, orchestrator)
}

impl SyncOrchestrator {
    /// The engine driven by this loop.
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Runs until shutdown, or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Sync loop started for {}", self.engine.device_name());
        let mut peer_open = true;

        loop {
            tokio::select! {
                item = self.inbox.recv() => match item {
                    None | Some(Inbox::Command(SyncCommand::Shutdown)) => break,
                    Some(Inbox::Command(SyncCommand::Trigger)) => self.start_pull(),
                    Some(Inbox::Command(SyncCommand::Push)) => self.push(),
                    Some(Inbox::PullCompleted(result)) => self.finish_pull(result),
                },
                incoming = self.channel.recv(), if peer_open => match incoming {
                    Some(message) => self.handle_incoming(message),
                    None => {
                        debug!("Peer channel closed");
                        peer_open = false;
                    }
                },
            }
        }

        info!("Sync loop stopped for {}", self.engine.device_name());
    }

    fn start_pull(&mut self) {
        let request = self.engine.begin_sync(self.channel.is_reachable());
        self.publish_status();
        let Some(request) = request else {
            return;
        };

        let Some(requeue) = self.requeue.upgrade() else {
            self.engine.handle_pull_failure(&SyncError::ChannelClosed);
            self.publish_status();
            return;
        };
        let channel = self.channel.clone();
        let envelope = request.to_envelope();
        tokio::spawn(async move {
            let result = channel.send_request(envelope).await;
            let _ = requeue.send(Inbox::PullCompleted(result));
        });
    }

    fn finish_pull(&mut self, result: SyncResult<Envelope>) {
        match result {
            Ok(envelope) => {
                let outcome = self.engine.handle_pull_reply(PeerReply::from_envelope(&envelope));
                if let Some(profile) = outcome.profile_changed {
                    self.emit(SyncEvent::ProfileChanged(profile));
                }
                if outcome.push_back {
                    self.schedule(SyncCommand::Push);
                }
            }
            Err(e) => self.engine.handle_pull_failure(&e),
        }
        self.publish_status();
    }

    /// Fire-and-forget; failures are logged only. A delivered push clears
    /// the pending flag, a failed one leaves it set.
    fn push(&mut self) {
        let Some(message) = self.engine.make_push() else {
            return;
        };
        let channel = self.channel.clone();
        let store = self.engine.store().clone();
        let envelope = message.to_envelope();
        tokio::spawn(async move {
            match channel.send_message(envelope).await {
                Ok(()) => {
                    if let Err(e) = store.clear_pending_sync() {
                        warn!("Failed to clear pending sync after push: {}", e);
                    }
                }
                Err(e) => warn!("Push to peer failed: {}", e),
            }
        });
    }

    fn handle_incoming(&mut self, incoming: IncomingMessage) {
        let message = match PeerMessage::from_envelope(&incoming.envelope) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring peer message: {}", e);
                return;
            }
        };
        debug!("Received {} from peer", message.action);

        let outcome = self.engine.handle_incoming(&message);
        if let Some(profile) = outcome.profile_changed {
            self.emit(SyncEvent::ProfileChanged(profile));
        }
        match (outcome.reply, incoming.reply) {
            (Some(reply), Some(handle)) => {
                if let Err(e) = handle.send(reply.to_envelope()) {
                    warn!("Failed to answer peer {}: {}", message.action, e);
                }
            }
            (Some(_), None) => debug!("Peer sent {} without awaiting a reply", message.action),
            (None, _) => {}
        }
    }

    fn schedule(&self, command: SyncCommand) {
        match self.requeue.upgrade() {
            Some(tx) => {
                let _ = tx.send(Inbox::Command(command));
            }
            None => debug!("Dropping {:?}, no handles left", command),
        }
    }

    fn publish_status(&mut self) {
        let current = self.engine.status().clone();
        let changed = self.status.send_if_modified(|published| {
            if *published == current {
                false
            } else {
                *published = current.clone();
                true
            }
        });
        if changed {
            self.emit(SyncEvent::StatusChanged(current));
        }
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }
}

//! Transport layer abstraction.
//!
//! [`PeerChannel`] is the bidirectional link to the paired device: request
//! with reply, fire-and-forget sends, and a stream of inbound messages. The
//! engine never touches it; the orchestrator does all the I/O.

use crate::error::{SyncError, SyncResult};
use crate::protocol::Envelope;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Sends the reply to an inbound request back through the link.
#[derive(Debug)]
pub struct ReplyHandle(oneshot::Sender<Envelope>);

impl ReplyHandle {
    /// Wraps a oneshot sender.
    pub fn new(sender: oneshot::Sender<Envelope>) -> Self {
        Self(sender)
    }

    /// Creates a linked handle and receiver.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<Envelope>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Sends the reply. Fails if the requester stopped waiting.
    pub fn send(self, reply: Envelope) -> SyncResult<()> {
        self.0.send(reply).map_err(|_| SyncError::ChannelClosed)
    }
}

/// A message received from the peer.
#[derive(Debug)]
pub struct IncomingMessage {
    pub envelope: Envelope,
    /// Present when the sender is waiting for a reply.
    pub reply: Option<ReplyHandle>,
}

/// The link to the paired device.
#[async_trait]
pub trait PeerChannel: Send + Sync {
    /// Whether the peer can be reached right now.
    fn is_reachable(&self) -> bool;

    /// Sends a message and waits for the peer's reply.
    ///
    /// Errors are transport failures. There is no timeout here beyond what
    /// the underlying link imposes.
    async fn send_request(&self, message: Envelope) -> SyncResult<Envelope>;

    /// Sends a message without expecting a reply.
    async fn send_message(&self, message: Envelope) -> SyncResult<()>;

    /// Receives the next inbound message.
    /// Returns `None` once the link is permanently closed.
    async fn recv(&self) -> Option<IncomingMessage>;
}

/// An in-memory paired link for tests and simulation.
pub mod memory {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::{Mutex as AsyncMutex, mpsc};

    #[derive(Debug, Default)]
    struct LinkState {
        reachable: AtomicBool,
        failure: Mutex<Option<String>>,
    }

    /// One end of an in-memory paired link.
    #[derive(Debug)]
    pub struct MemoryChannel {
        name: String,
        link: Arc<LinkState>,
        to_peer: mpsc::UnboundedSender<IncomingMessage>,
        inbox: AsyncMutex<mpsc::UnboundedReceiver<IncomingMessage>>,
    }

    impl MemoryChannel {
        /// Creates two connected, reachable endpoints.
        pub fn pair(name1: impl Into<String>, name2: impl Into<String>) -> (Self, Self) {
            let link = Arc::new(LinkState {
                reachable: AtomicBool::new(true),
                failure: Mutex::new(None),
            });
            let (tx1, rx1) = mpsc::unbounded_channel();
            let (tx2, rx2) = mpsc::unbounded_channel();

            let end1 = Self {
                name: name1.into(),
                link: link.clone(),
                to_peer: tx2,
                inbox: AsyncMutex::new(rx1),
            };
            let end2 = Self {
                name: name2.into(),
                link,
                to_peer: tx1,
                inbox: AsyncMutex::new(rx2),
            };
            (end1, end2)
        }

        /// The name of this endpoint.
        pub fn name(&self) -> &str {
            &self.name
        }

        /// Toggles reachability for both endpoints.
        pub fn set_reachable(&self, reachable: bool) {
            self.link.reachable.store(reachable, Ordering::SeqCst);
        }

        /// Makes every send fail with the given transport error, or clears it.
        pub fn set_failure(&self, reason: Option<&str>) {
            if let Ok(mut failure) = self.link.failure.lock() {
                *failure = reason.map(String::from);
            }
        }

        fn check_link(&self) -> SyncResult<()> {
            if !self.is_reachable() {
                return Err(SyncError::Network(format!("{}: peer not reachable", self.name)));
            }
            let failure = self.link.failure.lock().ok().and_then(|f| f.clone());
            match failure {
                Some(reason) => Err(SyncError::Unknown(reason)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PeerChannel for MemoryChannel {
        fn is_reachable(&self) -> bool {
            self.link.reachable.load(Ordering::SeqCst)
        }

        async fn send_request(&self, message: Envelope) -> SyncResult<Envelope> {
            self.check_link()?;
            let (reply, rx) = ReplyHandle::channel();
            self.to_peer
                .send(IncomingMessage {
                    envelope: message,
                    reply: Some(reply),
                })
                .map_err(|_| SyncError::ChannelClosed)?;
            rx.await.map_err(|_| SyncError::ChannelClosed)
        }

        async fn send_message(&self, message: Envelope) -> SyncResult<()> {
            self.check_link()?;
            self.to_peer
                .send(IncomingMessage {
                    envelope: message,
                    reply: None,
                })
                .map_err(|_| SyncError::ChannelClosed)
        }

        async fn recv(&self) -> Option<IncomingMessage> {
            self.inbox.lock().await.recv().await
        }
    }
}

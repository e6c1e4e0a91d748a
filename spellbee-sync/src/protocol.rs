//! Peer protocol messages.
//!
//! On the wire every message is an [`Envelope`]: a string-keyed map of plain
//! values, the shape the paired-device link carries. A message names its
//! `action` and may carry an encoded replica under `profile`. Replies carry
//! either `profile` or `noProfile`.
//!
//! Two generations of action names are in use (`requestProfile` /
//! `requestSync` and `profileUpdated` / `updateProfile`); each pair is
//! handled identically.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use spellbee_replica::{ReplicatedProfile, decode};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Envelope field names.
pub mod fields {
    pub const ACTION: &str = "action";
    pub const PROFILE: &str = "profile";
    pub const NO_PROFILE: &str = "noProfile";
}

/// A value inside an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeValue {
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
}

/// The wire form of every peer message and reply.
pub type Envelope = BTreeMap<String, EnvelopeValue>;

/// A recognized message action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    RequestProfile,
    RequestSync,
    UpdateProfile,
    ProfileUpdated,
}

impl Action {
    /// The wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestProfile => "requestProfile",
            Self::RequestSync => "requestSync",
            Self::UpdateProfile => "updateProfile",
            Self::ProfileUpdated => "profileUpdated",
        }
    }

    /// Asks the receiver for its replica.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::RequestProfile | Self::RequestSync)
    }

    /// Delivers the sender's replica.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self, Self::UpdateProfile | Self::ProfileUpdated)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requestProfile" => Ok(Self::RequestProfile),
            "requestSync" => Ok(Self::RequestSync),
            "updateProfile" => Ok(Self::UpdateProfile),
            "profileUpdated" => Ok(Self::ProfileUpdated),
            other => Err(SyncError::Protocol(format!("unknown action: {other}"))),
        }
    }
}

/// A message sent to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMessage {
    pub action: Action,
    /// Encoded replica, present on updates.
    pub profile: Option<Vec<u8>>,
}

impl PeerMessage {
    /// A pull request.
    #[must_use]
    pub fn request_profile() -> Self {
        Self {
            action: Action::RequestProfile,
            profile: None,
        }
    }

    /// A push carrying an encoded replica.
    #[must_use]
    pub fn profile_updated(profile: Vec<u8>) -> Self {
        Self {
            action: Action::ProfileUpdated,
            profile: Some(profile),
        }
    }

    /// Converts to the wire envelope.
    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        let mut envelope = Envelope::new();
        envelope.insert(
            fields::ACTION.to_string(),
            EnvelopeValue::String(self.action.as_str().to_string()),
        );
        if let Some(profile) = &self.profile {
            envelope.insert(fields::PROFILE.to_string(), EnvelopeValue::Bytes(profile.clone()));
        }
        envelope
    }

    /// Parses a wire envelope. Fails on a missing or unknown action.
    pub fn from_envelope(envelope: &Envelope) -> SyncResult<Self> {
        let action = match envelope.get(fields::ACTION) {
            Some(EnvelopeValue::String(action)) => action.parse()?,
            Some(_) => return Err(SyncError::Protocol("action is not a string".into())),
            None => return Err(SyncError::Protocol("missing action".into())),
        };
        let profile = match envelope.get(fields::PROFILE) {
            Some(EnvelopeValue::Bytes(bytes)) => Some(bytes.clone()),
            _ => None,
        };
        Ok(Self { action, profile })
    }

    /// Decodes the attached replica.
    pub fn decode_profile(&self) -> SyncResult<ReplicatedProfile> {
        let bytes = self
            .profile
            .as_deref()
            .ok_or_else(|| SyncError::Protocol(format!("{} without profile", self.action)))?;
        Ok(decode(bytes)?)
    }
}

/// The peer's answer to a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerReply {
    /// The peer's encoded replica.
    Profile(Vec<u8>),
    /// The peer has no replica.
    NoProfile,
    /// A reply carrying neither field.
    Unrecognized,
}

impl PeerReply {
    #[must_use]
    pub fn to_envelope(&self) -> Envelope {
        let mut envelope = Envelope::new();
        match self {
            Self::Profile(bytes) => {
                envelope.insert(fields::PROFILE.to_string(), EnvelopeValue::Bytes(bytes.clone()));
            }
            Self::NoProfile => {
                envelope.insert(fields::NO_PROFILE.to_string(), EnvelopeValue::Bool(true));
            }
            Self::Unrecognized => {}
        }
        envelope
    }

    /// Interprets a reply envelope. A `profile` blob takes precedence.
    #[must_use]
    pub fn from_envelope(envelope: &Envelope) -> Self {
        if let Some(EnvelopeValue::Bytes(bytes)) = envelope.get(fields::PROFILE) {
            return Self::Profile(bytes.clone());
        }
        match envelope.get(fields::NO_PROFILE) {
            Some(EnvelopeValue::Bool(true)) => Self::NoProfile,
            _ => Self::Unrecognized,
        }
    }
}

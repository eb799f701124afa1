use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of every playback channel name
pub const CHANNEL_PREFIX: &str = "playback_";

/// Role of a peer in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Issues playback commands and shows an extrapolated position
    #[serde(alias = "sender")]
    Controller,
    /// Owns the media element; authoritative source of playback state
    #[serde(alias = "receiver")]
    Display,
}

impl Role {
    /// The role expected on the other end of the channel
    #[must_use]
    pub fn peer(self) -> Self {
        match self {
            Self::Controller => Self::Display,
            Self::Display => Self::Controller,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller => f.write_str("controller"),
            Self::Display => f.write_str("display"),
        }
    }
}

/// Transport-assigned client identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wrap a transport client identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A playback session: one channel, one local role
///
/// Immutable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    channel_id: String,
    role: Role,
}

impl Session {
    /// Create a session for a shared channel identifier
    #[must_use]
    pub fn new(channel_id: impl Into<String>, role: Role) -> Self {
        Self {
            channel_id: channel_id.into(),
            role,
        }
    }

    /// Shared channel identifier (exchanged out-of-band)
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Local role
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Name of the publish/subscribe channel derived from the identifier
    #[must_use]
    pub fn channel_name(&self) -> String {
        format!("{CHANNEL_PREFIX}{}", self.channel_id)
    }
}

/// Controller-issued playback command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Pause if playing, play otherwise
    TogglePlayback,
    /// Seek relative to the current extrapolated position (seconds)
    SeekRelative(f64),
    /// Load a new media source
    LoadSource(String),
}

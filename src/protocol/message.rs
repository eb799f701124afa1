//! Message taxonomy

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{PlaybackState, PositionState, Role};

/// A protocol message
///
/// Closed set of kinds; anything else fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Message {
    /// Handshake announcement
    Discovery {
        /// Role of the announcing peer
        role: Role,
        /// Sender wall-clock time (ms since the Unix epoch)
        time_stamp: f64,
    },
    /// Clock-offset round trip
    Sync {
        /// Sender's current offset estimate (ms)
        delta: f64,
        /// Sender wall-clock time (ms)
        time_stamp: f64,
    },
    /// Authoritative playback snapshot (display to controller)
    State {
        /// Playing / paused / none
        playback_state: PlaybackState,
        /// Timeline position
        position_state: PositionState,
        /// Display wall-clock time at capture (ms)
        time_stamp: f64,
    },
    /// Play/pause command (controller to display)
    #[serde(rename = "playback_state")]
    SetPlayback {
        /// Requested state
        playback_state: PlaybackState,
    },
    /// Absolute seek command (controller to display)
    Seek {
        /// Target position in seconds
        position: f64,
    },
    /// Load command (controller to display)
    Source {
        /// Media URI
        source: String,
    },
}

impl Message {
    /// Build a snapshot message, replacing non-finite values
    #[must_use]
    pub fn state(
        playback_state: PlaybackState,
        position_state: PositionState,
        time_stamp: f64,
    ) -> Self {
        Self::State {
            playback_state,
            position_state: position_state.sanitized(),
            time_stamp,
        }
    }

    /// The `kind` discriminant as it appears on the wire
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Discovery { .. } => "discovery",
            Self::Sync { .. } => "sync",
            Self::State { .. } => "state",
            Self::SetPlayback { .. } => "playback_state",
            Self::Seek { .. } => "seek",
            Self::Source { .. } => "source",
        }
    }

    /// Whether a peer in `role` is a valid recipient of this kind
    #[must_use]
    pub fn accepted_by(&self, role: Role) -> bool {
        match self {
            Self::Discovery { .. } | Self::Sync { .. } => true,
            Self::State { .. } => role == Role::Controller,
            Self::SetPlayback { .. } | Self::Seek { .. } | Self::Source { .. } => {
                role == Role::Display
            }
        }
    }

    /// Encode as a JSON payload
    ///
    /// # Errors
    ///
    /// Returns `Codec` if serialization fails
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a JSON payload
    ///
    /// # Errors
    ///
    /// Returns `Codec` for unknown kinds or missing fields
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as a JSON string
    ///
    /// # Errors
    ///
    /// Returns `Codec` if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON string
    ///
    /// # Errors
    ///
    /// Returns `Codec` for malformed input
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

use thiserror::Error;

/// Errors that can occur during playsync operations
///
/// Protocol-level discards (unbound senders, out-of-context messages) are
/// not errors; see [`crate::pairing::Rejection`].
#[derive(Debug, Error)]
pub enum PlaysyncError {
    // ===== Pairing Errors =====
    /// Command issued while the session is not paired
    #[error("not paired (pairing state: {state})")]
    NotPaired {
        /// The pairing state at the time of the call
        state: String,
    },

    // ===== Transport Errors =====
    /// Transport operation failed
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
        /// The underlying source of the error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport went away underneath a running session
    #[error("disconnected: {reason}")]
    Disconnected {
        /// Reason given by the transport
        reason: String,
    },

    /// A session channel (command, media or event) was closed
    #[error("session channel closed")]
    ChannelClosed,

    // ===== Protocol Errors =====
    /// Message encoding/decoding failed
    #[error("codec error: {message}")]
    Codec {
        /// Description of the error
        message: String,
    },

    // ===== Media Errors =====
    /// No media element is attached to the display
    #[error("media element unavailable")]
    MediaUnavailable,

    /// Media element rejected an operation
    #[error("media error: {message}")]
    Media {
        /// Description of the error
        message: String,
    },

    /// Command argument rejected before anything was published
    #[error("invalid parameter: {name} - {message}")]
    InvalidParameter {
        /// The name of the parameter
        name: String,
        /// Description of the error
        message: String,
    },
}

impl PlaysyncError {
    /// Check if this error is recoverable by retrying
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotPaired { .. } | Self::Transport { .. })
    }

    /// Check if this error indicates connection loss
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Disconnected { .. } | Self::ChannelClosed)
    }
}

impl From<serde_json::Error> for PlaysyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec {
            message: err.to_string(),
        }
    }
}

/// Result type alias for playsync operations
pub type Result<T> = std::result::Result<T, PlaysyncError>;

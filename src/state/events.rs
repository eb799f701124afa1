//! Event bus for session events

use tokio::sync::broadcast;

use crate::media::MediaEvent;
use crate::pairing::PairingState;
use crate::types::{ClientId, PlaybackSnapshot};

/// Session events
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    // Connection events
    /// Transport connected
    Connected {
        /// Our client identity
        client: ClientId,
    },
    /// Transport disconnected; all session state was reset
    Disconnected {
        /// Reason for disconnection
        reason: String,
    },

    // Pairing events
    /// Pairing state changed
    PairingChanged {
        /// Old state
        old: PairingState,
        /// New state
        new: PairingState,
    },
    /// Bound to a peer
    Paired {
        /// The bound peer
        peer: ClientId,
    },

    // Controller events
    /// A display snapshot became the new baseline
    SnapshotApplied {
        /// Baseline after clock correction
        snapshot: PlaybackSnapshot,
    },
    /// Extrapolation advanced the baseline
    PositionTicked {
        /// Extrapolated position (seconds)
        position: f64,
    },

    // Display events
    /// A snapshot was published after a media event
    SnapshotPublished {
        /// Triggering media event
        trigger: MediaEvent,
    },
    /// A command could not be applied
    CommandDropped {
        /// Wire kind of the command
        kind: &'static str,
        /// Why it was dropped
        reason: String,
    },
}

/// Event bus for distributing events
pub struct EventBus {
    /// Broadcast sender
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    /// Subscribe to events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event
    pub fn emit(&self, event: SessionEvent) {
        // Ignore error if no receivers
        let _ = self.tx.send(event);
    }

    /// Get subscriber count
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event filter for selective subscription
pub struct EventFilter {
    rx: broadcast::Receiver<SessionEvent>,
    filter: Box<dyn Fn(&SessionEvent) -> bool + Send>,
}

impl EventFilter {
    /// Create a filtered event receiver
    pub fn new<F>(bus: &EventBus, filter: F) -> Self
    where
        F: Fn(&SessionEvent) -> bool + Send + 'static,
    {
        Self {
            rx: bus.subscribe(),
            filter: Box::new(filter),
        }
    }

    /// Receive next matching event
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if (self.filter)(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Helper functions for common filters
impl EventFilter {
    /// Filter for pairing and connection events only
    #[must_use]
    pub fn pairing_events(bus: &EventBus) -> Self {
        Self::new(bus, |e| {
            matches!(
                e,
                SessionEvent::Connected { .. }
                    | SessionEvent::Disconnected { .. }
                    | SessionEvent::PairingChanged { .. }
                    | SessionEvent::Paired { .. }
            )
        })
    }

    /// Filter for playback events only
    #[must_use]
    pub fn playback_events(bus: &EventBus) -> Self {
        Self::new(bus, |e| {
            matches!(
                e,
                SessionEvent::SnapshotApplied { .. }
                    | SessionEvent::PositionTicked { .. }
                    | SessionEvent::SnapshotPublished { .. }
            )
        })
    }

    /// Filter for dropped commands only
    #[must_use]
    pub fn dropped_commands(bus: &EventBus) -> Self {
        Self::new(bus, |e| matches!(e, SessionEvent::CommandDropped { .. }))
    }
}

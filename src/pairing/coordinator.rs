use std::fmt;

use crate::protocol::Message;
use crate::types::{ClientId, Role};

/// Pairing state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PairingState {
    /// Transport not connected
    #[default]
    Disconnected,
    /// Transport connecting, or connected but channel not yet subscribed
    Connecting,
    /// Subscribed to the channel, waiting for the peer
    Unpaired,
    /// Bound to exactly one peer
    Paired,
}

impl PairingState {
    /// Check if bound to a peer
    #[must_use]
    pub fn is_paired(self) -> bool {
        matches!(self, Self::Paired)
    }

    /// Check if the transport is connecting or connected
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for PairingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identities of both ends of the pairing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerBinding {
    self_id: Option<ClientId>,
    peer: Option<ClientId>,
}

impl PeerBinding {
    /// Own transport identity, once connected
    #[must_use]
    pub fn self_id(&self) -> Option<&ClientId> {
        self.self_id.as_ref()
    }

    /// Bound peer identity, once paired
    #[must_use]
    pub fn peer(&self) -> Option<&ClientId> {
        self.peer.as_ref()
    }

    /// Whether `sender` is the bound peer
    #[must_use]
    pub fn is_bound_to(&self, sender: &ClientId) -> bool {
        self.peer.as_ref() == Some(sender)
    }

    fn clear(&mut self) {
        self.self_id = None;
        self.peer = None;
    }
}

/// Why an inbound message was discarded
///
/// Discards are silent at the protocol level; these exist for logging and
/// tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Received before the channel subscription completed
    NotListening,
    /// Non-discovery message while unpaired
    AwaitingDiscovery,
    /// Discovery from the wrong role (including our own echo)
    UnexpectedRole,
    /// Sender is not the bound peer
    UnboundSender,
    /// Kind not valid for this role
    OutOfContext,
    /// Payload failed to decode
    Malformed,
}

/// Result of feeding a message to the handshake while unpaired
#[derive(Debug, Clone, PartialEq)]
pub enum PairingOutcome {
    /// Peer bound; publish `replies` in order
    Paired {
        /// The newly bound peer
        peer: ClientId,
        /// Messages to publish (display: discovery + first sync)
        replies: Vec<Message>,
    },
    /// Message ignored
    Ignored(Rejection),
}

/// Pairing state machine for one role
#[derive(Debug, Clone)]
pub struct PairingCoordinator {
    role: Role,
    state: PairingState,
    binding: PeerBinding,
}

impl PairingCoordinator {
    /// Create a coordinator in `Disconnected`
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: PairingState::Disconnected,
            binding: PeerBinding::default(),
        }
    }

    /// Local role
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PairingState {
        self.state
    }

    /// Peer identities
    #[must_use]
    pub fn binding(&self) -> &PeerBinding {
        &self.binding
    }

    /// Transport connection started
    pub fn begin_connect(&mut self) {
        self.transition(PairingState::Connecting);
    }

    /// Transport connected with our client identity
    pub fn on_connected(&mut self, client: ClientId) {
        self.binding.self_id = Some(client);
        self.transition(PairingState::Connecting);
    }

    /// Channel subscription confirmed; enter `Unpaired`
    ///
    /// As controller returns the one-shot discovery announcement.
    pub fn on_subscribed(&mut self, now_wall: f64) -> Option<Message> {
        self.binding.peer = None;
        self.transition(PairingState::Unpaired);
        self.announcement(now_wall)
    }

    /// Discovery announcement, if this role announces in the current state
    #[must_use]
    pub fn announcement(&self, now_wall: f64) -> Option<Message> {
        (self.role == Role::Controller && self.state == PairingState::Unpaired).then_some(
            Message::Discovery {
                role: Role::Controller,
                time_stamp: now_wall,
            },
        )
    }

    /// Feed a message received before pairing
    pub fn on_unpaired_message(
        &mut self,
        sender: &ClientId,
        message: &Message,
        now_wall: f64,
    ) -> PairingOutcome {
        if self.state != PairingState::Unpaired {
            return PairingOutcome::Ignored(Rejection::NotListening);
        }

        let Message::Discovery { role, time_stamp } = message else {
            return PairingOutcome::Ignored(Rejection::AwaitingDiscovery);
        };
        if *role != self.role.peer() {
            return PairingOutcome::Ignored(Rejection::UnexpectedRole);
        }

        let replies = self.handshake_replies(*time_stamp, now_wall);

        self.binding.peer = Some(sender.clone());
        self.transition(PairingState::Paired);
        tracing::info!(role = %self.role, peer = %sender, "paired");

        PairingOutcome::Paired {
            peer: sender.clone(),
            replies,
        }
    }

    /// Messages answering a peer's discovery
    ///
    /// The display replies with its own discovery followed by a first Sync
    /// seeded from the one-way delta; the controller does not reply.
    #[must_use]
    pub fn handshake_replies(&self, peer_time_stamp: f64, now_wall: f64) -> Vec<Message> {
        match self.role {
            Role::Display => vec![
                Message::Discovery {
                    role: Role::Display,
                    time_stamp: now_wall,
                },
                Message::Sync {
                    delta: now_wall - peer_time_stamp,
                    time_stamp: now_wall,
                },
            ],
            Role::Controller => Vec::new(),
        }
    }

    /// Admit a message once paired
    ///
    /// # Errors
    ///
    /// Returns the rejection if not paired or the sender is not the bound peer
    pub fn admit(&self, sender: &ClientId) -> Result<(), Rejection> {
        if self.state != PairingState::Paired {
            return Err(Rejection::NotListening);
        }
        if !self.binding.is_bound_to(sender) {
            return Err(Rejection::UnboundSender);
        }
        Ok(())
    }

    /// Drop the peer but stay subscribed
    pub fn unbind(&mut self) {
        if self.state == PairingState::Paired {
            self.binding.peer = None;
            self.transition(PairingState::Unpaired);
        }
    }

    /// Hard reset on transport loss
    pub fn reset(&mut self) {
        self.binding.clear();
        self.transition(PairingState::Disconnected);
    }

    fn transition(&mut self, next: PairingState) {
        if self.state != next {
            tracing::debug!(role = %self.role, from = %self.state, to = %next, "pairing state");
            self.state = next;
        }
    }
}

//! Display role

use std::fmt;

use crate::clock::{ClockSynchronizer, DisplayHeartbeat, SharedClock};
use crate::error::PlaysyncError;
use crate::media::{MediaElement, MediaEvent};
use crate::pairing::{PairingCoordinator, PairingOutcome, PairingState, Rejection};
use crate::protocol::Message;
use crate::replication::{CommandOutcome, DisplayReplicator};
use crate::state::{DisplayView, SessionEvent};
use crate::timer::{TimerKind, earliest};
use crate::transport::TransportEvent;
use crate::types::{ClientId, Role, Session, SessionConfig};

use super::{Action, Peer, decode, discard, pairing_changed};

/// Local inputs to a display session
pub enum DisplayInput {
    /// The media element reported a state change
    Media(MediaEvent),
    /// Attach the element commands are applied to
    Attach(Box<dyn MediaElement>),
    /// Detach the current element
    Detach,
}

impl fmt::Debug for DisplayInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Media(event) => f.debug_tuple("Media").field(event).finish(),
            Self::Attach(_) => f.write_str("Attach(..)"),
            Self::Detach => f.write_str("Detach"),
        }
    }
}

/// Display state machine
///
/// Waits for a controller's discovery, drives the resync heartbeat,
/// applies commands to the media element and publishes snapshots when the
/// element reports changes.
#[derive(Debug)]
pub struct DisplayPeer {
    session: Session,
    clock: SharedClock,
    pairing: PairingCoordinator,
    sync: ClockSynchronizer<DisplayHeartbeat>,
    replicator: DisplayReplicator,
}

impl DisplayPeer {
    /// Create a display for the configured channel
    #[must_use]
    pub fn new(config: &SessionConfig, clock: SharedClock) -> Self {
        Self {
            session: Session::new(config.channel_id.clone(), Role::Display),
            clock,
            pairing: PairingCoordinator::new(Role::Display),
            sync: ClockSynchronizer::new(DisplayHeartbeat::new(config.sync_interval)),
            replicator: DisplayReplicator::new(),
        }
    }

    /// The session this peer serves
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current clock-offset estimate (ms)
    #[must_use]
    pub fn estimate(&self) -> f64 {
        self.sync.estimate()
    }

    /// React to a media event; publishes a snapshot only while paired
    pub fn on_media_event(&mut self, event: MediaEvent) -> Vec<Action> {
        if !self.pairing.state().is_paired() {
            return vec![Action::Render];
        }
        let Some(snapshot) = self.replicator.on_media_event(event, self.clock.as_ref()) else {
            return Vec::new();
        };
        tracing::trace!(?event, "publishing snapshot");
        vec![
            Action::Publish(snapshot),
            Action::Emit(SessionEvent::SnapshotPublished { trigger: event }),
            Action::Render,
        ]
    }

    fn on_publication(&mut self, sender: &ClientId, data: serde_json::Value) -> Vec<Action> {
        let Ok(message) = decode(sender, data) else {
            return Vec::new();
        };

        if !self.pairing.state().is_paired() {
            return match self
                .pairing
                .on_unpaired_message(sender, &message, self.clock.wall_ms())
            {
                PairingOutcome::Paired { peer, replies } => {
                    // The pairing Sync starts the heartbeat
                    self.sync.cadence_mut().start(self.clock.as_ref());
                    let mut actions: Vec<Action> =
                        replies.into_iter().map(Action::Publish).collect();
                    actions.push(Action::Emit(SessionEvent::Paired { peer }));
                    actions
                }
                PairingOutcome::Ignored(rejection) => {
                    discard(Role::Display, sender, message.kind(), &rejection);
                    Vec::new()
                }
            };
        }

        if let Err(rejection) = self.pairing.admit(sender) {
            discard(Role::Display, sender, message.kind(), &rejection);
            return Vec::new();
        }
        if !message.accepted_by(Role::Display) {
            discard(Role::Display, sender, message.kind(), &Rejection::OutOfContext);
            return Vec::new();
        }

        match message {
            Message::Sync { delta, time_stamp } => {
                // Heartbeat re-arms; the display never answers directly
                self.sync.on_sync(delta, time_stamp, self.clock.as_ref());
                vec![Action::Render]
            }
            Message::SetPlayback { .. } | Message::Seek { .. } | Message::Source { .. } => {
                self.apply_command(&message)
            }
            Message::Discovery {
                role: Role::Controller,
                time_stamp,
            } => {
                // The bound controller re-announced: our reply was lost
                tracing::debug!(peer = %sender, "repeating handshake reply");
                self.pairing
                    .handshake_replies(time_stamp, self.clock.wall_ms())
                    .into_iter()
                    .map(Action::Publish)
                    .collect()
            }
            Message::Discovery { .. } | Message::State { .. } => {
                discard(Role::Display, sender, message.kind(), &Rejection::OutOfContext);
                Vec::new()
            }
        }
    }

    fn apply_command(&mut self, message: &Message) -> Vec<Action> {
        let reason = match self.replicator.apply(message) {
            CommandOutcome::Applied | CommandOutcome::Unchanged => return Vec::new(),
            CommandOutcome::NoMedia => PlaysyncError::MediaUnavailable.to_string(),
            CommandOutcome::Failed(reason) => reason,
            CommandOutcome::Rejected(rejection) => format!("{rejection:?}"),
        };
        vec![Action::Emit(SessionEvent::CommandDropped {
            kind: message.kind(),
            reason,
        })]
    }

    fn reset(&mut self) {
        self.pairing.reset();
        self.sync.reset();
    }

    fn is_session_channel(&self, channel: &str) -> bool {
        channel == self.session.channel_name()
    }
}

impl Peer for DisplayPeer {
    type View = DisplayView;
    type Input = DisplayInput;

    fn role(&self) -> Role {
        Role::Display
    }

    fn pairing_state(&self) -> PairingState {
        self.pairing.state()
    }

    fn begin_connect(&mut self) -> Vec<Action> {
        let before = self.pairing.state();
        self.pairing.begin_connect();
        let mut actions = Vec::new();
        pairing_changed(before, self.pairing.state(), &mut actions);
        actions
    }

    fn handle_transport(&mut self, event: TransportEvent) -> Vec<Action> {
        let before = self.pairing.state();
        let mut actions = match event {
            TransportEvent::Connected(info) => {
                self.pairing.on_connected(info.client.clone());
                vec![
                    Action::Emit(SessionEvent::Connected { client: info.client }),
                    Action::Subscribe,
                    Action::Render,
                ]
            }
            TransportEvent::Subscribed { channel } if self.is_session_channel(&channel) => {
                if self.pairing.state().is_paired() {
                    tracing::info!("re-subscribed while paired, dropping peer state");
                    self.sync.reset();
                }
                // Displays never announce
                self.pairing.on_subscribed(self.clock.wall_ms());
                Vec::new()
            }
            TransportEvent::Unsubscribed { channel }
                if self.is_session_channel(&channel) && self.pairing.state().is_active() =>
            {
                tracing::info!(%channel, "unsubscribed, closing connection");
                vec![Action::Disconnect]
            }
            TransportEvent::Disconnected(info) => {
                tracing::info!(reason = %info.reason, "disconnected");
                self.reset();
                vec![
                    Action::Emit(SessionEvent::Disconnected {
                        reason: info.reason,
                    }),
                    Action::Render,
                ]
            }
            TransportEvent::Publication {
                channel,
                sender,
                data,
            } if self.is_session_channel(&channel) => self.on_publication(&sender, data),
            TransportEvent::Subscribed { .. }
            | TransportEvent::Unsubscribed { .. }
            | TransportEvent::Publication { .. } => Vec::new(),
        };
        pairing_changed(before, self.pairing.state(), &mut actions);
        actions
    }

    fn handle_input(&mut self, input: DisplayInput) -> Vec<Action> {
        match input {
            DisplayInput::Media(event) => self.on_media_event(event),
            DisplayInput::Attach(media) => {
                self.replicator.attach(media);
                vec![Action::Render]
            }
            DisplayInput::Detach => {
                self.replicator.detach();
                vec![Action::Render]
            }
        }
    }

    fn handle_timers(&mut self) -> Vec<Action> {
        self.sync
            .on_timer(self.clock.as_ref())
            .map(Action::Publish)
            .into_iter()
            .collect()
    }

    fn next_deadline(&self) -> Option<(TimerKind, f64)> {
        earliest([(TimerKind::Resync, self.sync.deadline())])
    }

    fn view(&self) -> DisplayView {
        DisplayView {
            pairing: self.pairing.state(),
            peer: self.pairing.binding().peer().cloned(),
            estimate_ms: self.sync.estimate(),
            has_media: self.replicator.has_media(),
            playback_state: self.replicator.playback_state(),
        }
    }
}

//! Controller role

use tokio::sync::oneshot;

use crate::clock::{ClockSynchronizer, ControllerResponder, SharedClock};
use crate::error::{PlaysyncError, Result};
use crate::pairing::{PairingCoordinator, PairingOutcome, PairingState, Rejection};
use crate::protocol::Message;
use crate::replication::SnapshotIngest;
use crate::state::{ControllerView, SessionEvent};
use crate::timer::{Timer, TimerKind, earliest};
use crate::transport::TransportEvent;
use crate::types::{
    ClientId, Command, DiscoveryRetry, PlaybackSnapshot, Role, Session, SessionConfig,
};

use super::{Action, Peer, decode, discard, pairing_changed};

/// A user command submitted to a controller session
#[derive(Debug)]
pub struct CommandRequest {
    /// The command
    pub command: Command,
    /// Receives `NotPaired` if the command was refused
    pub reply: Option<oneshot::Sender<Result<()>>>,
}

/// Controller state machine
///
/// Announces itself once subscribed, answers every Sync, ingests display
/// snapshots and turns user commands into messages.
#[derive(Debug)]
pub struct ControllerPeer {
    session: Session,
    clock: SharedClock,
    pairing: PairingCoordinator,
    sync: ClockSynchronizer<ControllerResponder>,
    ingest: SnapshotIngest,
    retry: Option<DiscoveryRetry>,
    announce: Timer,
    announcements_left: u32,
}

impl ControllerPeer {
    /// Create a controller for the configured channel
    #[must_use]
    pub fn new(config: &SessionConfig, clock: SharedClock) -> Self {
        let retry = config.discovery_retry;
        Self {
            session: Session::new(config.channel_id.clone(), Role::Controller),
            clock,
            pairing: PairingCoordinator::new(Role::Controller),
            sync: ClockSynchronizer::new(ControllerResponder),
            ingest: SnapshotIngest::new(config.position_interval),
            retry,
            announce: Timer::new(retry.unwrap_or_default().interval),
            announcements_left: 0,
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

    /// Latest baseline
    #[must_use]
    pub fn baseline(&self) -> &PlaybackSnapshot {
        self.ingest.baseline()
    }

    /// Extrapolated position right now (seconds)
    #[must_use]
    pub fn current_position(&self) -> f64 {
        self.ingest.current_position(self.clock.as_ref())
    }

    /// Turn a user command into the message to publish
    ///
    /// # Errors
    ///
    /// Returns `NotPaired` unless bound to a display, or `InvalidParameter`
    /// for a non-finite seek offset or an empty source
    pub fn command(&mut self, command: &Command) -> Result<Vec<Action>> {
        let state = self.pairing.state();
        if !state.is_paired() {
            return Err(PlaysyncError::NotPaired {
                state: state.to_string(),
            });
        }

        let message = match command {
            Command::TogglePlayback => Message::SetPlayback {
                playback_state: self.ingest.baseline().playback_state.toggled(),
            },
            Command::SeekRelative(offset) if !offset.is_finite() => {
                return Err(PlaysyncError::InvalidParameter {
                    name: "offset".to_string(),
                    message: format!("seek offset must be finite, got {offset}"),
                });
            }
            Command::SeekRelative(offset) => Message::Seek {
                position: self.current_position() + offset,
            },
            Command::LoadSource(source) if source.trim().is_empty() => {
                return Err(PlaysyncError::InvalidParameter {
                    name: "source".to_string(),
                    message: "source URI is empty".to_string(),
                });
            }
            Command::LoadSource(source) => Message::Source {
                source: source.clone(),
            },
        };
        tracing::debug!(kind = message.kind(), "sending command");
        Ok(vec![Action::Publish(message)])
    }

    fn on_subscribed(&mut self) -> Vec<Action> {
        if self.pairing.state().is_paired() {
            // Re-subscribed: the old binding is gone along with its clock and baseline
            tracing::info!("re-subscribed while paired, dropping peer state");
            self.sync.reset();
            self.ingest.clear_baseline();
        }
        let mut actions = Vec::new();
        if let Some(announcement) = self.pairing.on_subscribed(self.clock.wall_ms()) {
            actions.push(Action::Publish(announcement));
            if let Some(retry) = self.retry {
                self.announcements_left = retry.attempts;
                if retry.attempts > 0 {
                    self.announce.arm(self.clock.now_ms());
                }
            }
        }
        actions
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
                    self.announce.cancel();
                    self.announcements_left = 0;
                    let mut actions: Vec<Action> =
                        replies.into_iter().map(Action::Publish).collect();
                    actions.push(Action::Emit(SessionEvent::Paired { peer }));
                    actions
                }
                PairingOutcome::Ignored(rejection) => {
                    discard(Role::Controller, sender, message.kind(), &rejection);
                    Vec::new()
                }
            };
        }

        if let Err(rejection) = self.pairing.admit(sender) {
            discard(Role::Controller, sender, message.kind(), &rejection);
            return Vec::new();
        }
        if !message.accepted_by(Role::Controller) {
            discard(Role::Controller, sender, message.kind(), &Rejection::OutOfContext);
            return Vec::new();
        }

        match message {
            Message::Sync { delta, time_stamp } => {
                let mut actions = Vec::new();
                if let Some(reply) = self.sync.on_sync(delta, time_stamp, self.clock.as_ref()) {
                    actions.push(Action::Publish(reply));
                }
                actions.push(Action::Render);
                actions
            }
            Message::State {
                playback_state,
                position_state,
                time_stamp,
            } => {
                let snapshot = self.ingest.ingest(
                    playback_state,
                    position_state,
                    time_stamp,
                    self.sync.estimate(),
                    self.clock.as_ref(),
                );
                vec![
                    Action::Emit(SessionEvent::SnapshotApplied { snapshot }),
                    Action::Render,
                ]
            }
            Message::Discovery { .. }
            | Message::SetPlayback { .. }
            | Message::Seek { .. }
            | Message::Source { .. } => {
                discard(Role::Controller, sender, message.kind(), &Rejection::OutOfContext);
                Vec::new()
            }
        }
    }

    fn on_announce_timer(&mut self) -> Option<Action> {
        if !self.announce.fire_if_due(self.clock.now_ms()) || self.announcements_left == 0 {
            return None;
        }
        let announcement = self.pairing.announcement(self.clock.wall_ms())?;
        self.announcements_left -= 1;
        if self.announcements_left > 0 {
            self.announce.arm(self.clock.now_ms());
        }
        tracing::debug!(left = self.announcements_left, "re-announcing discovery");
        Some(Action::Publish(announcement))
    }

    fn reset(&mut self) {
        self.pairing.reset();
        self.sync.reset();
        self.ingest.reset();
        self.announce.cancel();
        self.announcements_left = 0;
    }

    fn is_session_channel(&self, channel: &str) -> bool {
        channel == self.session.channel_name()
    }
}

impl Peer for ControllerPeer {
    type View = ControllerView;
    type Input = CommandRequest;

    fn role(&self) -> Role {
        Role::Controller
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
                self.ingest.set_latency(info.latency_ms);
                vec![
                    Action::Emit(SessionEvent::Connected { client: info.client }),
                    Action::Subscribe,
                    Action::Render,
                ]
            }
            TransportEvent::Subscribed { channel } if self.is_session_channel(&channel) => {
                self.on_subscribed()
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

    fn handle_input(&mut self, request: CommandRequest) -> Vec<Action> {
        let (actions, outcome) = match self.command(&request.command) {
            Ok(actions) => (actions, Ok(())),
            Err(e) => {
                tracing::debug!(error = %e, "command refused");
                (Vec::new(), Err(e))
            }
        };
        if let Some(reply) = request.reply {
            let _ = reply.send(outcome);
        }
        actions
    }

    fn handle_timers(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(advanced) = self.ingest.tick(self.clock.as_ref()) {
            actions.push(Action::Emit(SessionEvent::PositionTicked {
                position: advanced.position_state.position,
            }));
            actions.push(Action::Render);
        }
        actions.extend(self.on_announce_timer());
        actions
    }

    fn next_deadline(&self) -> Option<(TimerKind, f64)> {
        earliest([
            (TimerKind::Position, self.ingest.deadline()),
            (TimerKind::Announce, self.announce.deadline()),
        ])
    }

    fn view(&self) -> ControllerView {
        ControllerView {
            pairing: self.pairing.state(),
            peer: self.pairing.binding().peer().cloned(),
            snapshot: *self.ingest.baseline(),
            estimate_ms: self.sync.estimate(),
            latency_ms: self.ingest.latency_ms(),
        }
    }
}

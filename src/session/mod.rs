//! Async session driver
//!
//! [`PlaybackSession`] owns a transport and one role peer. Its loop waits
//! on transport events, local inputs, the earliest peer timer and the
//! shutdown signal, feeds whichever fires into the peer and carries out
//! the returned actions. Inputs are processed one at a time; the peer is
//! never touched concurrently.

mod handle;
#[cfg(test)]
mod tests;

pub use handle::{ControllerHandle, DisplayHandle};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::clock::{SharedClock, SystemClock};
use crate::error::{PlaysyncError, Result};
use crate::peer::{Action, ControllerPeer, DisplayPeer, Peer};
use crate::state::{EventBus, StateContainer};
use crate::transport::{Transport, TransportEvents};
use crate::types::{Role, Session, SessionConfig};

/// Channels shared between a session and its handles
pub(crate) struct Shared<P: Peer> {
    pub(crate) inputs: mpsc::UnboundedSender<P::Input>,
    pub(crate) view: Arc<StateContainer<P::View>>,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) shutdown: Arc<watch::Sender<bool>>,
}

impl<P: Peer> Clone for Shared<P> {
    fn clone(&self) -> Self {
        Self {
            inputs: self.inputs.clone(),
            view: Arc::clone(&self.view),
            bus: Arc::clone(&self.bus),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

/// A running playback session for one role
///
/// Created together with a handle; call [`run`](Self::run) (usually via
/// `tokio::spawn`) to drive it. The loop ends when the handle requests a
/// shutdown, every handle is dropped, or the transport event stream closes.
pub struct PlaybackSession<P: Peer, T: Transport> {
    peer: P,
    transport: T,
    channel: String,
    clock: SharedClock,
    events: TransportEvents,
    inputs: mpsc::UnboundedReceiver<P::Input>,
    shutdown: watch::Receiver<bool>,
    view: Arc<StateContainer<P::View>>,
    bus: Arc<EventBus>,
}

impl<T: Transport> PlaybackSession<ControllerPeer, T> {
    /// Create a controller session on the system clock
    ///
    /// The configured role is ignored; the session is always a controller.
    #[must_use]
    pub fn controller(
        config: SessionConfig,
        transport: T,
        events: TransportEvents,
    ) -> (Self, ControllerHandle) {
        Self::controller_with_clock(config, transport, events, SystemClock::shared())
    }

    /// Create a controller session on a custom clock
    #[must_use]
    pub fn controller_with_clock(
        config: SessionConfig,
        transport: T,
        events: TransportEvents,
        clock: SharedClock,
    ) -> (Self, ControllerHandle) {
        let peer = ControllerPeer::new(&config, Arc::clone(&clock));
        let (session, shared) =
            Self::assemble(peer, &config, Role::Controller, transport, events, clock);
        (session, ControllerHandle::new(shared, config.seek_step))
    }
}

impl<T: Transport> PlaybackSession<DisplayPeer, T> {
    /// Create a display session on the system clock
    ///
    /// The configured role is ignored; the session is always a display.
    #[must_use]
    pub fn display(
        config: SessionConfig,
        transport: T,
        events: TransportEvents,
    ) -> (Self, DisplayHandle) {
        Self::display_with_clock(config, transport, events, SystemClock::shared())
    }

    /// Create a display session on a custom clock
    #[must_use]
    pub fn display_with_clock(
        config: SessionConfig,
        transport: T,
        events: TransportEvents,
        clock: SharedClock,
    ) -> (Self, DisplayHandle) {
        let peer = DisplayPeer::new(&config, Arc::clone(&clock));
        let (session, shared) =
            Self::assemble(peer, &config, Role::Display, transport, events, clock);
        (session, DisplayHandle::new(shared))
    }
}

impl<P: Peer, T: Transport> PlaybackSession<P, T> {
    fn assemble(
        peer: P,
        config: &SessionConfig,
        role: Role,
        transport: T,
        events: TransportEvents,
        clock: SharedClock,
    ) -> (Self, Shared<P>) {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let view = Arc::new(StateContainer::new());
        let bus = Arc::new(EventBus::new());

        let session = Self {
            peer,
            transport,
            channel: Session::new(config.channel_id.clone(), role).channel_name(),
            clock,
            events,
            inputs: inputs_rx,
            shutdown: shutdown_rx,
            view: Arc::clone(&view),
            bus: Arc::clone(&bus),
        };
        let shared = Shared {
            inputs: inputs_tx,
            view,
            bus,
            shutdown: Arc::new(shutdown_tx),
        };
        (session, shared)
    }

    /// Name of the channel this session joins
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The role peer
    #[must_use]
    pub fn peer(&self) -> &P {
        &self.peer
    }

    /// Connect the transport and drive the session until shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to start connecting, or
    /// `Disconnected` if the transport event stream ends while running
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(role = %self.peer.role(), channel = %self.channel, "session starting");

        let actions = self.peer.begin_connect();
        self.apply(actions).await;
        self.transport.connect().await?;

        let mut inputs_open = true;
        let mut outcome = Ok(());
        loop {
            let deadline = self.peer.next_deadline().map(|(_, at)| self.instant_at(at));

            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        tracing::debug!("session shutdown requested");
                        break;
                    }
                }

                event = self.events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("transport event stream closed");
                        outcome = Err(PlaysyncError::Disconnected {
                            reason: "transport event stream closed".to_string(),
                        });
                        break;
                    };
                    let actions = self.peer.handle_transport(event);
                    self.apply(actions).await;
                }

                input = self.inputs.recv(), if inputs_open => {
                    match input {
                        Some(input) => {
                            let actions = self.peer.handle_input(input);
                            self.apply(actions).await;
                        }
                        None => inputs_open = false,
                    }
                }

                () = async {
                    match deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending().await,
                    }
                } => {
                    let actions = self.peer.handle_timers();
                    self.apply(actions).await;
                }
            }
        }

        self.teardown().await;
        tracing::info!(role = %self.peer.role(), "session stopped");
        outcome
    }

    /// Carry out peer actions in order
    async fn apply(&mut self, actions: Vec<Action>) {
        let mut render = false;
        for action in actions {
            match action {
                Action::Subscribe => {
                    if let Err(e) = self.transport.subscribe(&self.channel).await {
                        tracing::warn!(error = %e, channel = %self.channel, "subscribe failed");
                    }
                }
                Action::Publish(message) => match message.to_value() {
                    Ok(data) => {
                        tracing::trace!(kind = message.kind(), "publishing");
                        if let Err(e) = self.transport.publish(&self.channel, data).await {
                            tracing::warn!(error = %e, kind = message.kind(), "publish failed");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to encode message"),
                },
                Action::Disconnect => {
                    if let Err(e) = self.transport.disconnect().await {
                        tracing::warn!(error = %e, "disconnect failed");
                    }
                }
                Action::Render => render = true,
                Action::Emit(event) => self.bus.emit(event),
            }
        }
        if render {
            self.view.set(self.peer.view()).await;
        }
    }

    /// Close the transport and let the peer observe the resulting events
    async fn teardown(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!(error = %e, "disconnect failed during shutdown");
        }
        let mut render = false;
        while let Ok(event) = self.events.try_recv() {
            for action in self.peer.handle_transport(event) {
                match action {
                    Action::Render => render = true,
                    Action::Emit(event) => self.bus.emit(event),
                    // The transport is closed; nothing more goes out
                    Action::Subscribe | Action::Publish(_) | Action::Disconnect => {}
                }
            }
        }
        if render {
            self.view.set(self.peer.view()).await;
        }
    }

    /// Tokio instant at which a peer deadline (local monotonic ms) falls due
    ///
    /// Rounded up to whole milliseconds so the timer is due on wake-up.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn instant_at(&self, deadline_ms: f64) -> Instant {
        let wait_ms = (deadline_ms - self.clock.now_ms()).max(0.0).ceil();
        Instant::now() + Duration::from_millis(wait_ms as u64)
    }
}

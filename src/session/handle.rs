use tokio::sync::{broadcast, oneshot, watch};

use super::Shared;
use crate::error::{PlaysyncError, Result};
use crate::media::{MediaElement, MediaEvent, MediaEventSink};
use crate::peer::{CommandRequest, ControllerPeer, DisplayInput, DisplayPeer};
use crate::state::{ControllerView, DisplayView, EventBus, SessionEvent};
use crate::types::Command;

/// Handle to a running controller session
///
/// Cheap to clone. Dropping every handle stops the session.
#[derive(Clone)]
pub struct ControllerHandle {
    shared: Shared<ControllerPeer>,
    seek_step: f64,
}

impl ControllerHandle {
    pub(crate) fn new(shared: Shared<ControllerPeer>, seek_step: f64) -> Self {
        Self { shared, seek_step }
    }

    /// Submit a command and wait until the session accepted or refused it
    ///
    /// # Errors
    ///
    /// Returns `NotPaired` if no display is bound, or `ChannelClosed` if the
    /// session has stopped
    pub async fn command(&self, command: Command) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.shared
            .inputs
            .send(CommandRequest {
                command,
                reply: Some(reply_tx),
            })
            .map_err(|_| PlaysyncError::ChannelClosed)?;
        reply_rx.await.map_err(|_| PlaysyncError::ChannelClosed)?
    }

    /// Pause if playing, play otherwise
    ///
    /// # Errors
    ///
    /// See [`command`](Self::command)
    pub async fn toggle_playback(&self) -> Result<()> {
        self.command(Command::TogglePlayback).await
    }

    /// Seek forward by the configured step
    ///
    /// # Errors
    ///
    /// See [`command`](Self::command)
    pub async fn seek_forward(&self) -> Result<()> {
        self.command(Command::SeekRelative(self.seek_step)).await
    }

    /// Seek backward by the configured step
    ///
    /// # Errors
    ///
    /// See [`command`](Self::command)
    pub async fn seek_backward(&self) -> Result<()> {
        self.command(Command::SeekRelative(-self.seek_step)).await
    }

    /// Ask the display to load a new source
    ///
    /// # Errors
    ///
    /// See [`command`](Self::command)
    pub async fn load_source(&self, uri: impl Into<String>) -> Result<()> {
        self.command(Command::LoadSource(uri.into())).await
    }

    /// Latest rendered view
    pub async fn view(&self) -> ControllerView {
        self.shared.view.get().await
    }

    /// Watch view updates
    #[must_use]
    pub fn subscribe_view(&self) -> watch::Receiver<ControllerView> {
        self.shared.view.subscribe()
    }

    /// Subscribe to session events
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.bus.subscribe()
    }

    /// Event bus, for building filtered subscriptions
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.shared.bus
    }

    /// Stop the session; the transport is disconnected
    pub fn shutdown(&self) {
        let _ = self.shared.shutdown.send(true);
    }

    /// Whether the session loop is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.inputs.is_closed()
    }
}

/// Handle to a running display session
///
/// Cheap to clone. Dropping every handle stops the session.
#[derive(Clone)]
pub struct DisplayHandle {
    shared: Shared<DisplayPeer>,
}

impl DisplayHandle {
    pub(crate) fn new(shared: Shared<DisplayPeer>) -> Self {
        Self { shared }
    }

    /// Attach the media element commands are applied to
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the session has stopped
    pub fn attach_media(&self, media: impl MediaElement + 'static) -> Result<()> {
        self.send(DisplayInput::Attach(Box::new(media)))
    }

    /// Detach the media element; later commands are dropped
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the session has stopped
    pub fn detach_media(&self) -> Result<()> {
        self.send(DisplayInput::Detach)
    }

    /// Report a media event
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the session has stopped
    pub fn report(&self, event: MediaEvent) -> Result<()> {
        self.send(DisplayInput::Media(event))
    }

    /// Sink that forwards a media element's events into this session
    #[must_use]
    pub fn media_sink(&self) -> MediaEventSink {
        let inputs = self.shared.inputs.clone();
        MediaEventSink::new(move |event| inputs.send(DisplayInput::Media(event)).is_ok())
    }

    /// Latest rendered view
    pub async fn view(&self) -> DisplayView {
        self.shared.view.get().await
    }

    /// Watch view updates
    #[must_use]
    pub fn subscribe_view(&self) -> watch::Receiver<DisplayView> {
        self.shared.view.subscribe()
    }

    /// Subscribe to session events
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.bus.subscribe()
    }

    /// Event bus, for building filtered subscriptions
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.shared.bus
    }

    /// Stop the session; the transport is disconnected
    pub fn shutdown(&self) {
        let _ = self.shared.shutdown.send(true);
    }

    /// Whether the session loop is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.inputs.is_closed()
    }

    fn send(&self, input: DisplayInput) -> Result<()> {
        self.shared
            .inputs
            .send(input)
            .map_err(|_| PlaysyncError::ChannelClosed)
    }
}

//! Display side: snapshot publication and command intake

use crate::clock::Clock;
use crate::media::{MediaElement, MediaEvent};
use crate::pairing::Rejection;
use crate::protocol::Message;
use crate::types::PlaybackState;

/// Result of applying a controller command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Media element mutated; its events will publish the snapshot
    Applied,
    /// Already in the requested state
    Unchanged,
    /// No media element attached; command dropped
    NoMedia,
    /// Media element refused the operation
    Failed(String),
    /// Not a command kind
    Rejected(Rejection),
}

/// Owner of the display's media element
#[derive(Default)]
pub struct DisplayReplicator {
    media: Option<Box<dyn MediaElement>>,
}

impl std::fmt::Debug for DisplayReplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayReplicator")
            .field("has_media", &self.media.is_some())
            .finish()
    }
}

impl DisplayReplicator {
    /// Create a replicator without a media element
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the media element commands are applied to
    pub fn attach(&mut self, media: Box<dyn MediaElement>) {
        self.media = Some(media);
    }

    /// Detach the media element; later commands are dropped
    pub fn detach(&mut self) -> Option<Box<dyn MediaElement>> {
        self.media.take()
    }

    /// Whether a media element is attached
    #[must_use]
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Playback state of the attached element
    #[must_use]
    pub fn playback_state(&self) -> PlaybackState {
        self.media
            .as_deref()
            .map_or(PlaybackState::None, |media| media.playback_state())
    }

    /// Capture the current snapshot, stamped with the display wall clock
    #[must_use]
    pub fn capture(&self, clock: &dyn Clock) -> Option<Message> {
        let media = self.media.as_deref()?;
        Some(Message::state(
            media.playback_state(),
            media.position_state(),
            clock.wall_ms(),
        ))
    }

    /// React to a media event with at most one snapshot
    #[must_use]
    pub fn on_media_event(&self, event: MediaEvent, clock: &dyn Clock) -> Option<Message> {
        if !event.publishes_snapshot() {
            return None;
        }
        self.capture(clock)
    }

    /// Apply a controller command to the media element
    ///
    /// Commands never publish snapshots themselves.
    pub fn apply(&mut self, message: &Message) -> CommandOutcome {
        if !matches!(
            message,
            Message::SetPlayback { .. } | Message::Seek { .. } | Message::Source { .. }
        ) {
            return CommandOutcome::Rejected(Rejection::OutOfContext);
        }
        let Some(media) = self.media.as_deref_mut() else {
            tracing::debug!(kind = message.kind(), "no media element, dropping command");
            return CommandOutcome::NoMedia;
        };

        match message {
            Message::SetPlayback { playback_state } => match playback_state {
                PlaybackState::Paused if !media.is_paused() => {
                    media.pause();
                    CommandOutcome::Applied
                }
                PlaybackState::Playing if media.is_paused() => match media.play() {
                    Ok(()) => CommandOutcome::Applied,
                    Err(e) => {
                        tracing::warn!(error = %e, "media refused to play");
                        CommandOutcome::Failed(e.to_string())
                    }
                },
                _ => CommandOutcome::Unchanged,
            },
            Message::Seek { position } => {
                media.set_position(*position);
                CommandOutcome::Applied
            }
            Message::Source { source } => {
                media.set_source(source);
                CommandOutcome::Applied
            }
            _ => CommandOutcome::Rejected(Rejection::OutOfContext),
        }
    }
}

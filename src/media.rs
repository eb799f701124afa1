//! Media element seam on the display side
//!
//! The element that decodes and renders audio/video is external. The
//! display applies commands to it directly and learns about the results
//! through [`MediaEvent`]s fed back by the embedder.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::{PlaybackState, PositionState};

/// Media element driven by the display
pub trait MediaElement: Send {
    /// Whether the element is paused
    fn is_paused(&self) -> bool;

    /// Whether a source is loaded
    fn has_source(&self) -> bool;

    /// Current timeline position
    fn position_state(&self) -> PositionState;

    /// Start playback
    ///
    /// # Errors
    ///
    /// Returns an error if the element refuses to play (e.g. no source)
    fn play(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self);

    /// Jump to an absolute position (seconds)
    fn set_position(&mut self, seconds: f64);

    /// Replace the media source
    fn set_source(&mut self, uri: &str);

    /// Playback state as published in snapshots
    fn playback_state(&self) -> PlaybackState {
        if !self.has_source() {
            PlaybackState::None
        } else if self.is_paused() {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }
}

/// State-affecting notifications from the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    /// Duration became known or changed
    DurationChanged,
    /// Playback rate changed
    RateChanged,
    /// Periodic position progress; does not publish a snapshot
    TimeUpdate,
    /// A seek finished
    Seeked,
    /// Playback started
    Play,
    /// Playback paused
    Pause,
    /// Source was cleared or reset
    Emptied,
}

impl MediaEvent {
    /// Whether this event triggers a snapshot publication
    #[must_use]
    pub fn publishes_snapshot(self) -> bool {
        !matches!(self, Self::TimeUpdate)
    }
}

/// Where a media element reports its events
///
/// Wraps whatever forwards events into the display session.
#[derive(Clone)]
pub struct MediaEventSink {
    forward: Arc<dyn Fn(MediaEvent) -> bool + Send + Sync>,
}

impl MediaEventSink {
    /// Create a sink from a forwarding function
    ///
    /// The function returns `false` once the receiving side is gone.
    pub fn new(forward: impl Fn(MediaEvent) -> bool + Send + Sync + 'static) -> Self {
        Self {
            forward: Arc::new(forward),
        }
    }

    /// Report an event; returns `false` if nobody is listening
    pub fn emit(&self, event: MediaEvent) -> bool {
        (self.forward)(event)
    }
}

impl fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaEventSink").finish_non_exhaustive()
    }
}

impl From<mpsc::UnboundedSender<MediaEvent>> for MediaEventSink {
    fn from(tx: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self::new(move |event| tx.send(event).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_update_does_not_publish() {
        assert!(!MediaEvent::TimeUpdate.publishes_snapshot());
        for event in [
            MediaEvent::DurationChanged,
            MediaEvent::RateChanged,
            MediaEvent::Seeked,
            MediaEvent::Play,
            MediaEvent::Pause,
            MediaEvent::Emptied,
        ] {
            assert!(event.publishes_snapshot(), "{event:?}");
        }
    }

    #[test]
    fn test_sink_from_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = MediaEventSink::from(tx);
        assert!(sink.emit(MediaEvent::Seeked));
        assert_eq!(rx.try_recv().unwrap(), MediaEvent::Seeked);

        drop(rx);
        assert!(!sink.emit(MediaEvent::Pause));
    }
}

//! In-memory media element
//!
//! Behaves like a browser media element as far as the protocol can tell:
//! every state change emits the matching [`MediaEvent`] on a channel,
//! and the position advances with the clock while playing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clock::SharedClock;
use crate::error::{PlaysyncError, Result};
use crate::media::{MediaElement, MediaEvent, MediaEventSink};
use crate::types::PositionState;

#[derive(Debug)]
struct Inner {
    source: Option<String>,
    paused: bool,
    duration: f64,
    playback_rate: f64,
    /// Position at `anchor_ms`
    position: f64,
    anchor_ms: f64,
}

/// Simulated media element
///
/// Clones share state, so a test can keep one clone for inspection while
/// the display owns another.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    inner: Arc<Mutex<Inner>>,
    clock: SharedClock,
    events: MediaEventSink,
    source_duration: f64,
}

impl SimulatedMedia {
    /// Create an empty element reporting events on `events`
    #[must_use]
    pub fn new(clock: SharedClock, events: impl Into<MediaEventSink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                source: None,
                paused: true,
                duration: f64::NAN,
                playback_rate: 1.0,
                position: 0.0,
                anchor_ms: 0.0,
            })),
            clock,
            events: events.into(),
            source_duration: 180.0,
        }
    }

    /// Duration assigned to every loaded source (default: 180s)
    #[must_use]
    pub fn with_source_duration(mut self, seconds: f64) -> Self {
        self.source_duration = seconds;
        self
    }

    /// Currently loaded source
    #[must_use]
    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    /// Change the playback rate
    pub fn set_rate(&mut self, rate: f64) {
        let now = self.clock.now_ms();
        {
            let mut inner = self.lock();
            inner.position = Self::position_at(&inner, now);
            inner.anchor_ms = now;
            inner.playback_rate = rate;
        }
        self.emit(MediaEvent::RateChanged);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: MediaEvent) {
        // The display may already be gone at teardown
        self.events.emit(event);
    }

    fn position_at(inner: &Inner, now_ms: f64) -> f64 {
        let position = if inner.paused {
            inner.position
        } else {
            inner.position + (now_ms - inner.anchor_ms) * inner.playback_rate / 1000.0
        };
        if inner.duration.is_finite() {
            position.clamp(0.0, inner.duration)
        } else {
            position.max(0.0)
        }
    }
}

impl MediaElement for SimulatedMedia {
    fn is_paused(&self) -> bool {
        self.lock().paused
    }

    fn has_source(&self) -> bool {
        self.lock().source.is_some()
    }

    fn position_state(&self) -> PositionState {
        let now = self.clock.now_ms();
        let inner = self.lock();
        PositionState {
            duration: inner.duration,
            playback_rate: inner.playback_rate,
            position: Self::position_at(&inner, now),
        }
    }

    fn play(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        {
            let mut inner = self.lock();
            if inner.source.is_none() {
                return Err(PlaysyncError::Media {
                    message: "no source loaded".to_string(),
                });
            }
            if !inner.paused {
                return Ok(());
            }
            inner.paused = false;
            inner.anchor_ms = now;
        }
        self.emit(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        let now = self.clock.now_ms();
        {
            let mut inner = self.lock();
            if inner.paused {
                return;
            }
            inner.position = Self::position_at(&inner, now);
            inner.anchor_ms = now;
            inner.paused = true;
        }
        self.emit(MediaEvent::Pause);
    }

    fn set_position(&mut self, seconds: f64) {
        let now = self.clock.now_ms();
        {
            let mut inner = self.lock();
            inner.position = if inner.duration.is_finite() {
                seconds.clamp(0.0, inner.duration)
            } else {
                seconds.max(0.0)
            };
            inner.anchor_ms = now;
        }
        self.emit(MediaEvent::Seeked);
    }

    fn set_source(&mut self, uri: &str) {
        let now = self.clock.now_ms();
        {
            let mut inner = self.lock();
            inner.source = Some(uri.to_string());
            inner.paused = true;
            inner.position = 0.0;
            inner.anchor_ms = now;
            inner.duration = self.source_duration;
        }
        self.emit(MediaEvent::Emptied);
        self.emit(MediaEvent::DurationChanged);
    }
}

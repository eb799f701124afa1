//! Rendered views of each role

use crate::pairing::PairingState;
use crate::position::format_time;
use crate::types::{ClientId, PlaybackSnapshot, PlaybackState};

/// What a controller UI renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerView {
    /// Pairing state
    pub pairing: PairingState,
    /// Bound display, once paired
    pub peer: Option<ClientId>,
    /// Latest baseline, advanced by extrapolation ticks
    pub snapshot: PlaybackSnapshot,
    /// Clock-offset estimate (ms)
    pub estimate_ms: f64,
    /// Transport latency reported on connect (ms)
    pub latency_ms: f64,
}

impl ControllerView {
    /// Whether the display reported playback
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.snapshot.playback_state.is_playing()
    }

    /// Position shown to the user, within `[0, duration]`
    #[must_use]
    pub fn position(&self) -> f64 {
        self.snapshot.position_state.clamped_position()
    }

    /// Media duration in seconds
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.snapshot.position_state.duration
    }

    /// `position / duration` as text, e.g. `1:05 / 3:00`
    #[must_use]
    pub fn display_time(&self) -> String {
        format!("{} / {}", format_time(self.position()), format_time(self.duration()))
    }

    /// Whether playback controls should be enabled
    #[must_use]
    pub fn controls_enabled(&self) -> bool {
        self.pairing.is_paired()
    }
}

/// What a display UI renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayView {
    /// Pairing state
    pub pairing: PairingState,
    /// Bound controller, once paired
    pub peer: Option<ClientId>,
    /// Clock-offset estimate (ms)
    pub estimate_ms: f64,
    /// Whether a media element is attached
    pub has_media: bool,
    /// Playback state of the attached element
    pub playback_state: PlaybackState,
}

impl DisplayView {
    /// Whether the media element should be shown
    #[must_use]
    pub fn shows_media(&self) -> bool {
        self.pairing.is_paired() && self.has_media
    }
}

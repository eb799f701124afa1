use serde::{Deserialize, Deserializer, Serialize};

/// Playback state reported by the display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded yet
    #[default]
    None,
    /// Playback is paused
    Paused,
    /// Media is currently playing
    Playing,
}

impl PlaybackState {
    /// Whether media is currently playing
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// The state a toggle command asks for
    #[must_use]
    pub fn toggled(self) -> Self {
        if self.is_playing() {
            Self::Paused
        } else {
            Self::Playing
        }
    }
}

/// Position of the media timeline (seconds)
///
/// A `null` field (a non-finite value on the sending side) decodes to the
/// default for that field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    /// Media duration in seconds (0 when unknown)
    #[serde(deserialize_with = "null_as_zero")]
    pub duration: f64,
    /// Playback rate (1.0 = normal speed)
    #[serde(deserialize_with = "null_as_normal_rate")]
    pub playback_rate: f64,
    /// Current position in seconds
    #[serde(deserialize_with = "null_as_zero")]
    pub position: f64,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn null_as_normal_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(1.0))
}

impl Default for PositionState {
    fn default() -> Self {
        Self {
            duration: 0.0,
            playback_rate: 1.0,
            position: 0.0,
        }
    }
}

impl PositionState {
    /// Replace values JSON cannot carry
    ///
    /// Media elements report `NaN` duration before metadata is loaded.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            duration: finite_or(self.duration, 0.0),
            playback_rate: finite_or(self.playback_rate, 1.0),
            position: finite_or(self.position, 0.0),
        }
    }

    /// Position clamped to the duration, as shown to users
    #[must_use]
    pub fn clamped_position(&self) -> f64 {
        self.position.min(self.duration)
    }
}

/// Authoritative playback state as last reported by the display
///
/// Replaced wholesale on every update; never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    /// Playing / paused / none
    pub playback_state: PlaybackState,
    /// Timeline position when the snapshot was taken
    pub position_state: PositionState,
    /// Local monotonic time (ms) corresponding to `position_state`
    pub origin_ms: f64,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            playback_state: PlaybackState::None,
            position_state: PositionState::default(),
            origin_ms: 0.0,
        }
    }
}

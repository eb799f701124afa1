use std::time::Duration;

use crate::timer::Timer;
use crate::types::{PlaybackSnapshot, PositionState};

/// Position after `elapsed_ms` of playback at the state's rate.
///
/// Negative elapsed time (a baseline stamped in the future after clock
/// correction) does not move the position backwards.
#[must_use]
pub fn extrapolate(position_state: &PositionState, elapsed_ms: f64) -> f64 {
    position_state.position + elapsed_ms.max(0.0) * position_state.playback_rate / 1000.0
}

/// Periodic extrapolator holding the current baseline
#[derive(Debug, Clone)]
pub struct PositionEstimator {
    baseline: PlaybackSnapshot,
    timer: Timer,
}

impl PositionEstimator {
    /// Create an estimator with the default (empty) baseline
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            baseline: PlaybackSnapshot::default(),
            timer: Timer::new(interval),
        }
    }

    /// Current baseline
    #[must_use]
    pub fn baseline(&self) -> &PlaybackSnapshot {
        &self.baseline
    }

    /// Replace the baseline wholesale
    ///
    /// Cancels the running timer and re-arms it only while playing.
    pub fn replace(&mut self, baseline: PlaybackSnapshot, now_ms: f64) {
        self.timer.cancel();
        self.baseline = baseline;
        if self.baseline.playback_state.is_playing() {
            self.timer.arm(now_ms);
        }
    }

    /// Handle a timer expiration
    ///
    /// Returns the advanced baseline when the tick was due. Uses the actual
    /// elapsed time since the previous anchor, not the nominal interval.
    pub fn tick(&mut self, now_ms: f64) -> Option<PlaybackSnapshot> {
        if !self.timer.fire_if_due(now_ms) {
            return None;
        }
        let elapsed = now_ms - self.baseline.origin_ms;
        let advanced = PlaybackSnapshot {
            position_state: PositionState {
                position: extrapolate(&self.baseline.position_state, elapsed),
                ..self.baseline.position_state
            },
            origin_ms: now_ms,
            ..self.baseline
        };
        self.replace(advanced, now_ms);
        Some(advanced)
    }

    /// Best estimate of the position right now
    #[must_use]
    pub fn current_position(&self, now_ms: f64) -> f64 {
        if self.baseline.playback_state.is_playing() {
            extrapolate(
                &self.baseline.position_state,
                now_ms - self.baseline.origin_ms,
            )
        } else {
            self.baseline.position_state.position
        }
    }

    /// Outstanding tick deadline
    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.timer.deadline()
    }

    /// Whether the tick timer is armed
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    /// Cancel the tick timer, keeping the baseline
    pub fn stop(&mut self) {
        self.timer.cancel();
    }

    /// Cancel the timer and drop the baseline
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.baseline = PlaybackSnapshot::default();
    }
}

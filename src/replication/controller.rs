//! Controller side: snapshot ingestion

use std::time::Duration;

use crate::clock::Clock;
use crate::position::PositionEstimator;
use crate::types::{PlaybackSnapshot, PlaybackState, PositionState};

/// Local monotonic time (ms) associated with a display snapshot.
///
/// `time_stamp - local_origin` moves the display's wall-clock stamp onto
/// the local monotonic axis; the measured transport latency, the current
/// clock-offset estimate and the one-way delta at receipt are then added.
#[must_use]
pub fn corrected_origin(
    time_stamp: f64,
    local_origin: f64,
    latency_ms: f64,
    estimate_ms: f64,
    now_wall: f64,
) -> f64 {
    let one_way_delta = now_wall - time_stamp;
    time_stamp - local_origin + latency_ms + estimate_ms + one_way_delta
}

/// Stores the latest snapshot and drives the position estimator
#[derive(Debug, Clone)]
pub struct SnapshotIngest {
    latency_ms: f64,
    estimator: PositionEstimator,
}

impl SnapshotIngest {
    /// Create an ingest stage with the given extrapolation interval
    #[must_use]
    pub fn new(position_interval: Duration) -> Self {
        Self {
            latency_ms: 0.0,
            estimator: PositionEstimator::new(position_interval),
        }
    }

    /// Transport latency reported on connect
    pub fn set_latency(&mut self, latency_ms: f64) {
        self.latency_ms = latency_ms;
    }

    /// Measured transport latency (ms)
    #[must_use]
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// Ingest a `state` message and make it the new baseline
    pub fn ingest(
        &mut self,
        playback_state: PlaybackState,
        position_state: PositionState,
        time_stamp: f64,
        estimate_ms: f64,
        clock: &dyn Clock,
    ) -> PlaybackSnapshot {
        self.estimator.stop();
        let snapshot = PlaybackSnapshot {
            playback_state,
            position_state,
            origin_ms: corrected_origin(
                time_stamp,
                clock.origin_ms(),
                self.latency_ms,
                estimate_ms,
                clock.wall_ms(),
            ),
        };
        self.estimator.replace(snapshot, clock.now_ms());
        tracing::debug!(
            state = ?playback_state,
            position = position_state.position,
            origin_ms = snapshot.origin_ms,
            "snapshot applied"
        );
        snapshot
    }

    /// Forward a timer expiration to the estimator
    pub fn tick(&mut self, clock: &dyn Clock) -> Option<PlaybackSnapshot> {
        self.estimator.tick(clock.now_ms())
    }

    /// Current baseline
    #[must_use]
    pub fn baseline(&self) -> &PlaybackSnapshot {
        self.estimator.baseline()
    }

    /// Extrapolated position right now
    #[must_use]
    pub fn current_position(&self, clock: &dyn Clock) -> f64 {
        self.estimator.current_position(clock.now_ms())
    }

    /// Outstanding extrapolation deadline
    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.estimator.deadline()
    }

    /// Whether extrapolation is running
    #[must_use]
    pub fn is_extrapolating(&self) -> bool {
        self.estimator.is_running()
    }

    /// Drop the baseline and stop extrapolating; the latency is kept
    pub fn clear_baseline(&mut self) {
        self.estimator.reset();
    }

    /// Drop baseline, latency and timer
    pub fn reset(&mut self) {
        self.latency_ms = 0.0;
        self.estimator.reset();
    }
}

//! Clock-offset synchronization.
//!
//! Both roles apply the same update rule to every inbound Sync message:
//!
//! ```text
//! one_way  = now - message.timeStamp
//! estimate = (message.delta + one_way) / 2
//! ```
//!
//! This is a two-sample low-pass filter rather than a full NTP exchange:
//! the peer-reported delta is averaged with a freshly measured one-way
//! delta. What differs between roles is the cadence, expressed by a
//! [`SyncCadence`] strategy: the display drives a heartbeat, the controller
//! only answers.

use std::time::Duration;

use super::Clock;
use crate::protocol::Message;
use crate::timer::Timer;

/// Apply the averaging rule to one Sync sample.
///
/// - `peer_delta`: estimate reported by the peer (ms)
/// - `peer_time_stamp`: peer wall clock when the message was sent (ms)
/// - `now_wall`: local wall clock at receipt (ms)
#[must_use]
pub fn update_estimate(peer_delta: f64, peer_time_stamp: f64, now_wall: f64) -> f64 {
    let one_way_delta = now_wall - peer_time_stamp;
    (peer_delta + one_way_delta) / 2.0
}

/// Role-specific reaction to estimate updates and timer expirations.
pub trait SyncCadence: Send {
    /// Called after the estimate was refreshed from an inbound Sync.
    fn after_update(&mut self, estimate: f64, clock: &dyn Clock) -> Option<Message>;

    /// Called when the session driver reports a timer expiration.
    fn on_timer(&mut self, estimate: f64, clock: &dyn Clock) -> Option<Message>;

    /// Outstanding timer deadline (local monotonic ms).
    fn deadline(&self) -> Option<f64>;

    /// Cancel any outstanding timer.
    fn stop(&mut self);
}

/// Display cadence: owns the resync heartbeat.
///
/// Every Sync receipt re-arms a one-shot timer; on expiry the current
/// estimate is republished and the timer re-armed, giving a steady cadence
/// whenever the controller does not answer sooner.
#[derive(Debug, Clone)]
pub struct DisplayHeartbeat {
    timer: Timer,
}

impl DisplayHeartbeat {
    /// Create a heartbeat with the given interval
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: Timer::new(interval),
        }
    }

    /// Arm the heartbeat without an inbound sample (pairing Sync sent)
    pub fn start(&mut self, clock: &dyn Clock) {
        self.timer.arm(clock.now_ms());
    }
}

impl SyncCadence for DisplayHeartbeat {
    fn after_update(&mut self, _estimate: f64, clock: &dyn Clock) -> Option<Message> {
        self.timer.cancel();
        self.timer.arm(clock.now_ms());
        None
    }

    fn on_timer(&mut self, estimate: f64, clock: &dyn Clock) -> Option<Message> {
        if !self.timer.fire_if_due(clock.now_ms()) {
            return None;
        }
        self.timer.arm(clock.now_ms());
        Some(Message::Sync {
            delta: estimate,
            time_stamp: clock.wall_ms(),
        })
    }

    fn deadline(&self) -> Option<f64> {
        self.timer.deadline()
    }

    fn stop(&mut self) {
        self.timer.cancel();
    }
}

/// Controller cadence: answers every Sync immediately, never initiates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerResponder;

impl SyncCadence for ControllerResponder {
    fn after_update(&mut self, estimate: f64, clock: &dyn Clock) -> Option<Message> {
        Some(Message::Sync {
            delta: estimate,
            time_stamp: clock.wall_ms(),
        })
    }

    fn on_timer(&mut self, _estimate: f64, _clock: &dyn Clock) -> Option<Message> {
        None
    }

    fn deadline(&self) -> Option<f64> {
        None
    }

    fn stop(&mut self) {}
}

/// Owner of the clock-offset estimate ("peer clock - local clock", ms).
///
/// The estimate only changes through [`update_estimate`] or [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct ClockSynchronizer<C> {
    estimate: f64,
    samples: u64,
    cadence: C,
}

impl<C: SyncCadence> ClockSynchronizer<C> {
    /// Create a synchronizer with a zero estimate
    #[must_use]
    pub fn new(cadence: C) -> Self {
        Self {
            estimate: 0.0,
            samples: 0,
            cadence,
        }
    }

    /// Current offset estimate in milliseconds
    #[must_use]
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Number of samples applied since the last reset
    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Apply an inbound Sync sample and let the cadence react.
    ///
    /// Returns the Sync message to publish, if the cadence wants one.
    pub fn on_sync(
        &mut self,
        peer_delta: f64,
        peer_time_stamp: f64,
        clock: &dyn Clock,
    ) -> Option<Message> {
        self.estimate = update_estimate(peer_delta, peer_time_stamp, clock.wall_ms());
        self.samples += 1;
        tracing::trace!(
            estimate_ms = self.estimate,
            samples = self.samples,
            "clock estimate updated"
        );
        self.cadence.after_update(self.estimate, clock)
    }

    /// Forward a timer expiration to the cadence
    pub fn on_timer(&mut self, clock: &dyn Clock) -> Option<Message> {
        self.cadence.on_timer(self.estimate, clock)
    }

    /// Outstanding cadence deadline
    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.cadence.deadline()
    }

    /// Mutable access to the cadence strategy
    pub fn cadence_mut(&mut self) -> &mut C {
        &mut self.cadence
    }

    /// Zero the estimate and cancel cadence timers
    pub fn reset(&mut self) {
        self.estimate = 0.0;
        self.samples = 0;
        self.cadence.stop();
    }
}

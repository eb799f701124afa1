//! Cancelable, re-armable single-shot timers
//!
//! Timers hold a deadline on the local monotonic clock instead of owning a
//! background task. The session driver sleeps until the earliest deadline
//! and hands expirations back to the owning component, so cancellation is
//! synchronous: once `cancel` returns the timer can no longer fire.

use std::time::Duration;

/// Which component a timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Display resync heartbeat
    Resync,
    /// Controller position extrapolation
    Position,
    /// Controller discovery re-announcement (opt-in retry policy)
    Announce,
}

/// Single-shot timer with at most one outstanding deadline
#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    deadline: Option<f64>,
}

impl Timer {
    /// Create a disarmed timer
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Interval in milliseconds
    #[must_use]
    pub fn interval_ms(&self) -> f64 {
        self.interval.as_secs_f64() * 1000.0
    }

    /// Arm the timer one interval after `now_ms`, replacing any earlier deadline
    pub fn arm(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.interval_ms());
    }

    /// Cancel the outstanding deadline, if any
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a deadline is outstanding
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Outstanding deadline (local monotonic ms)
    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// Consume the deadline if it has passed
    ///
    /// Returns `true` exactly once per arming.
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now_ms => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of several optional deadlines
#[must_use]
pub fn earliest<I>(deadlines: I) -> Option<(TimerKind, f64)>
where
    I: IntoIterator<Item = (TimerKind, Option<f64>)>,
{
    deadlines
        .into_iter()
        .filter_map(|(kind, deadline)| deadline.map(|d| (kind, d)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

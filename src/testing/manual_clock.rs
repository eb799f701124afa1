//! Hand-advanced clock for deterministic tests

use std::sync::{Arc, Mutex};

use crate::clock::Clock;

/// Clock whose monotonic time only moves when told to
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin_ms: f64,
    now_ms: Arc<Mutex<f64>>,
}

impl ManualClock {
    /// Create a clock at monotonic time 0 with the given wall-clock origin
    #[must_use]
    pub fn new(origin_ms: f64) -> Self {
        Self {
            origin_ms,
            now_ms: Arc::new(Mutex::new(0.0)),
        }
    }

    /// Move time forward
    pub fn advance(&self, ms: f64) {
        *self.lock() += ms;
    }

    /// Set the monotonic time
    pub fn set(&self, ms: f64) {
        *self.lock() = ms;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, f64> {
        // A poisoned clock still holds a valid f64
        self.now_ms.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn origin_ms(&self) -> f64 {
        self.origin_ms
    }

    fn now_ms(&self) -> f64 {
        *self.lock()
    }
}

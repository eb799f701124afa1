//! Local clocks and peer clock-offset estimation
//!
//! Two time bases are used throughout:
//!
//! - **wall** time: milliseconds since the Unix epoch, the only time base
//!   that crosses the wire (`timeStamp` fields);
//! - **monotonic** time: milliseconds since the clock's origin, used for
//!   timers and position extrapolation.
//!
//! `wall = origin + monotonic`.

pub mod sync;


use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub use sync::{
    ClockSynchronizer, ControllerResponder, DisplayHeartbeat, SyncCadence, update_estimate,
};

/// Source of local time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Wall-clock time of the monotonic origin (ms since the Unix epoch)
    fn origin_ms(&self) -> f64;

    /// Monotonic time since the origin (ms)
    fn now_ms(&self) -> f64;

    /// Current wall-clock time (ms since the Unix epoch)
    fn wall_ms(&self) -> f64 {
        self.origin_ms() + self.now_ms()
    }
}

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock>;

/// System clock
///
/// Elapsed time is measured with `tokio::time::Instant`, so tests running
/// with a paused tokio clock see deterministic time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin_ms: f64,
    start: tokio::time::Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        let origin_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0;
        Self {
            origin_ms,
            start: tokio::time::Instant::now(),
        }
    }

    /// Create a shared handle to a new system clock
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn origin_ms(&self) -> f64 {
        self.origin_ms
    }

    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

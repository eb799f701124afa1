//! Channel condition simulation for testing

use rand::Rng;
use std::time::Duration;

/// Channel condition simulator
///
/// Applied per delivery by the in-memory broker. Delivery order per
/// subscriber is preserved: jitter delays the queue, it never reorders it.
#[derive(Clone, Debug)]
pub struct NetworkSimulator {
    /// Message loss probability (0.0 to 1.0)
    pub loss_rate: f64,
    /// Jitter range (max delay added)
    pub jitter_ms: u32,
    /// Base delay added to all messages
    pub delay_ms: u32,
}

impl NetworkSimulator {
    /// Perfect channel (no issues)
    #[must_use]
    pub fn perfect() -> Self {
        Self {
            loss_rate: 0.0,
            jitter_ms: 0,
            delay_ms: 0,
        }
    }

    /// Fixed latency, no jitter or loss
    #[must_use]
    pub fn fixed_delay(delay_ms: u32) -> Self {
        Self {
            loss_rate: 0.0,
            jitter_ms: 0,
            delay_ms,
        }
    }

    /// Typical hosted pub/sub over home broadband
    #[must_use]
    pub fn broadband() -> Self {
        Self {
            loss_rate: 0.0,
            jitter_ms: 10,
            delay_ms: 25,
        }
    }

    /// Mobile network conditions
    #[must_use]
    pub fn mobile() -> Self {
        Self {
            loss_rate: 0.01,
            jitter_ms: 60,
            delay_ms: 80,
        }
    }

    /// Very poor conditions (stress test)
    #[must_use]
    pub fn stress_test() -> Self {
        Self {
            loss_rate: 0.10,
            jitter_ms: 100,
            delay_ms: 50,
        }
    }

    /// Should this message be dropped?
    #[must_use]
    pub fn should_drop(&self) -> bool {
        if self.loss_rate <= 0.0 {
            return false;
        }
        rand::thread_rng().gen_bool(self.loss_rate.min(1.0))
    }

    /// Get delay for this message
    #[must_use]
    pub fn get_delay(&self) -> Duration {
        let jitter: u32 = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        } else {
            0
        };

        Duration::from_millis(u64::from(self.delay_ms + jitter))
    }

    /// Latency reported to clients on connect (ms)
    #[must_use]
    pub fn nominal_latency_ms(&self) -> f64 {
        f64::from(self.delay_ms) + f64::from(self.jitter_ms) / 2.0
    }
}

impl Default for NetworkSimulator {
    fn default() -> Self {
        Self::perfect()
    }
}

use std::time::Duration;

use super::session::{Role, Session};

/// Retry policy for the controller's discovery announcement
///
/// Not part of the default handshake: without it the controller announces
/// exactly once, and a display that subscribes later never pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryRetry {
    /// Additional announcements after the first one
    pub attempts: u32,
    /// Delay between announcements
    pub interval: Duration,
}

impl Default for DiscoveryRetry {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(1),
        }
    }
}

/// Configuration for a playback session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Shared channel identifier (default: random UUID v4)
    pub channel_id: String,

    /// Local role (default: display)
    pub role: Role,

    /// Interval of the display's resync heartbeat (default: 250ms)
    pub sync_interval: Duration,

    /// Interval of the controller's position extrapolation (default: 250ms)
    pub position_interval: Duration,

    /// Step used by the seek-forward / seek-backward helpers (default: 10s)
    pub seek_step: f64,

    /// Optional discovery retry (default: none, single announcement)
    pub discovery_retry: Option<DiscoveryRetry>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_id: uuid::Uuid::new_v4().to_string(),
            role: Role::Display,
            sync_interval: Duration::from_millis(250),
            position_interval: Duration::from_millis(250),
            seek_step: 10.0,
            discovery_retry: None,
        }
    }
}

impl SessionConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// The immutable session described by this config
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.channel_id.clone(), self.role)
    }
}

/// Builder for `SessionConfig`
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the shared channel identifier
    #[must_use]
    pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.config.channel_id = channel_id.into();
        self
    }

    /// Set the local role
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Set the resync heartbeat interval
    #[must_use]
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.config.sync_interval = interval;
        self
    }

    /// Set the position extrapolation interval
    #[must_use]
    pub fn position_interval(mut self, interval: Duration) -> Self {
        self.config.position_interval = interval;
        self
    }

    /// Set the seek step in seconds
    #[must_use]
    pub fn seek_step(mut self, seconds: f64) -> Self {
        self.config.seek_step = seconds;
        self
    }

    /// Enable discovery retries
    #[must_use]
    pub fn discovery_retry(mut self, retry: DiscoveryRetry) -> Self {
        self.config.discovery_retry = Some(retry);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

//! Common test utilities and fixtures
#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use playsync::testing::{NetworkSimulator, SimulatedMedia};
use playsync::transport::memory::MemoryBroker;
use playsync::{
    ControllerHandle, DisplayHandle, MediaElement, PairingState, PlaybackSession, SessionConfig,
    SystemClock,
};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialize test logging (call once per test module)
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive("playsync=debug".parse().unwrap());

        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Create a test configuration on a fixed channel
pub fn test_config(channel: &str) -> SessionConfig {
    SessionConfig::builder()
        .channel_id(channel)
        .sync_interval(Duration::from_millis(250))
        .position_interval(Duration::from_millis(250))
        .build()
}

/// Wait until a view satisfies `predicate`
pub async fn reach<T: Clone>(mut rx: watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) -> T {
    let value = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("session gone")
        .clone();
    value
}

/// A paired controller and display sharing one broker
pub struct Rig {
    pub broker: MemoryBroker,
    pub controller: ControllerHandle,
    pub display: DisplayHandle,
    pub media: SimulatedMedia,
}

impl Rig {
    /// Start a display with a loaded element, then a controller, and wait for pairing
    pub async fn start(channel: &str, simulator: NetworkSimulator) -> Self {
        let broker = MemoryBroker::with_simulator(simulator);

        let (transport, events) = broker.transport();
        let (session, display) = PlaybackSession::display(test_config(channel), transport, events);
        tokio::spawn(session.run());

        let mut media = SimulatedMedia::new(SystemClock::shared(), display.media_sink())
            .with_source_duration(240.0);
        media.set_source("https://example.com/clip.mp4");
        display.attach_media(media.clone()).unwrap();
        reach(display.subscribe_view(), |v| v.pairing == PairingState::Unpaired).await;

        let (transport, events) = broker.transport();
        let (session, controller) =
            PlaybackSession::controller(test_config(channel), transport, events);
        tokio::spawn(session.run());

        reach(controller.subscribe_view(), |v| v.pairing.is_paired()).await;
        reach(display.subscribe_view(), |v| v.pairing.is_paired()).await;

        Self {
            broker,
            controller,
            display,
            media,
        }
    }
}

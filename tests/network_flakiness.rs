use std::time::Duration;

use playsync::testing::{NetworkSimulator, SimulatedMedia};
use playsync::transport::memory::MemoryBroker;
use playsync::{
    ControllerHandle, DisplayHandle, MediaElement, PairingState, PlaybackSession, SessionConfig,
    SystemClock,
};
use tokio::sync::watch;

async fn reach<T: Clone>(mut rx: watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) -> T {
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await
        .expect("timed out")
        .expect("session gone")
        .clone()
}

async fn paired_over(
    simulator: NetworkSimulator,
) -> (ControllerHandle, DisplayHandle, SimulatedMedia) {
    let broker = MemoryBroker::with_simulator(simulator);
    let config = SessionConfig::builder().channel_id("flaky").build();

    let (transport, events) = broker.transport();
    let (session, display) = PlaybackSession::display(config.clone(), transport, events);
    tokio::spawn(session.run());
    let mut media = SimulatedMedia::new(SystemClock::shared(), display.media_sink());
    media.set_source("https://example.com/stream.mp4");
    display.attach_media(media.clone()).unwrap();
    reach(display.subscribe_view(), |v| v.pairing == PairingState::Unpaired).await;

    let (transport, events) = broker.transport();
    let (session, controller) = PlaybackSession::controller(config, transport, events);
    tokio::spawn(session.run());
    reach(controller.subscribe_view(), |v| v.pairing.is_paired()).await;
    reach(display.subscribe_view(), |v| v.pairing.is_paired()).await;
    (controller, display, media)
}

#[tokio::test(start_paused = true)]
async fn test_pairing_over_fixed_delay() {
    let (controller, display, _media) = paired_over(NetworkSimulator::fixed_delay(40)).await;

    let view = controller.view().await;
    assert_eq!(view.latency_ms, 40.0);
    assert!(display.view().await.shows_media());
}

#[tokio::test(start_paused = true)]
async fn test_extrapolation_tracks_display_under_delay() {
    let (controller, _display, media) = paired_over(NetworkSimulator::fixed_delay(40)).await;

    controller.toggle_playback().await.unwrap();
    reach(controller.subscribe_view(), |v| v.is_playing()).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    let shown = controller.view().await.position();
    let actual = media.position_state().position;
    // Transit time enters the origin correction more than once; the gap stays small
    assert!((shown - actual).abs() < 0.5, "shown {shown}, actual {actual}");
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_survives_jitter() {
    let (controller, display, _media) = paired_over(NetworkSimulator::broadband()).await;

    tokio::time::sleep(Duration::from_secs(5)).await;

    let controller_estimate = controller.view().await.estimate_ms;
    let display_estimate = display.view().await.estimate_ms;
    assert!(controller_estimate.is_finite());
    assert!(display_estimate.is_finite());
    assert!(controller_estimate.abs() < 200.0);
    assert!(display_estimate.abs() < 200.0);
}

#[tokio::test(start_paused = true)]
async fn test_commands_apply_in_order_under_jitter() {
    let (controller, _display, media) = paired_over(NetworkSimulator {
        loss_rate: 0.0,
        jitter_ms: 60,
        delay_ms: 80,
    }).await;

    controller.toggle_playback().await.unwrap();
    reach(controller.subscribe_view(), |v| v.is_playing()).await;
    for _ in 0..3 {
        controller.seek_forward().await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    let view = reach(controller.subscribe_view(), |v| v.position() > 25.0).await;
    assert!(!media.is_paused());
    assert!(view.position() < 40.0);
}

//! End-to-end replication between a controller and a display

use std::time::Duration;

mod common;
use common::{Rig, init_logging, reach};
use playsync::state::EventFilter;
use playsync::testing::NetworkSimulator;
use playsync::{MediaElement, PlaybackState, SessionEvent};

#[tokio::test(start_paused = true)]
async fn test_toggle_and_position_display() -> anyhow::Result<()> {
    init_logging();
    let rig = Rig::start("replication-toggle", NetworkSimulator::perfect()).await;

    rig.controller.toggle_playback().await?;
    reach(rig.controller.subscribe_view(), |v| v.is_playing()).await;

    tokio::time::sleep(Duration::from_millis(65_500)).await;
    let view = rig.controller.view().await;
    tracing::info!(display_time = %view.display_time(), "after 65.5s");
    assert_eq!(view.display_time(), "1:05 / 4:00");

    rig.controller.toggle_playback().await?;
    let paused = reach(rig.controller.subscribe_view(), |v| {
        v.snapshot.playback_state == PlaybackState::Paused
    })
    .await;
    assert!(rig.media.is_paused());
    assert!((paused.position() - rig.media.position_state().position).abs() < 1e-6);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_seek_backward_clamps_at_start() -> anyhow::Result<()> {
    init_logging();
    let rig = Rig::start("replication-seek", NetworkSimulator::perfect()).await;

    rig.controller.seek_backward().await?;

    // The display clamps the negative target and reports where it landed
    reach(rig.display.subscribe_view(), |v| v.playback_state == PlaybackState::Paused).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.media.position_state().position, 0.0);
    assert_eq!(rig.controller.view().await.position(), 0.0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rate_change_reaches_controller() -> anyhow::Result<()> {
    init_logging();
    let mut rig = Rig::start("replication-rate", NetworkSimulator::perfect()).await;
    rig.controller.toggle_playback().await?;
    reach(rig.controller.subscribe_view(), |v| v.is_playing()).await;

    rig.media.set_rate(2.0);

    let view = reach(rig.controller.subscribe_view(), |v| {
        (v.snapshot.position_state.playback_rate - 2.0).abs() < f64::EPSILON
    })
    .await;
    assert!(view.is_playing());

    let before = rig.controller.view().await.position();
    tokio::time::sleep(Duration::from_secs(3)).await;
    let after = rig.controller.view().await.position();
    assert!((after - before - 6.0).abs() < 1.0, "advanced {}", after - before);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_detached_display_drops_commands() -> anyhow::Result<()> {
    init_logging();
    let rig = Rig::start("replication-detach", NetworkSimulator::perfect()).await;
    let mut dropped = EventFilter::dropped_commands(rig.display.event_bus());

    rig.display.detach_media()?;
    reach(rig.display.subscribe_view(), |v| !v.has_media).await;
    rig.controller.seek_forward().await?;

    let event = tokio::time::timeout(Duration::from_secs(5), dropped.recv())
        .await?
        .expect("event bus closed");
    assert!(matches!(event, SessionEvent::CommandDropped { kind: "seek", .. }));
    assert!(rig.media.is_paused());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_display_events_reported_to_controller() -> anyhow::Result<()> {
    init_logging();
    let rig = Rig::start("replication-events", NetworkSimulator::broadband()).await;
    let mut applied = EventFilter::playback_events(rig.controller.event_bus());

    rig.controller.load_source("https://example.com/other.mp4").await?;

    let event = tokio::time::timeout(Duration::from_secs(5), applied.recv())
        .await?
        .expect("event bus closed");
    assert!(matches!(event, SessionEvent::SnapshotApplied { .. }));
    assert_eq!(rig.media.source().as_deref(), Some("https://example.com/other.mp4"));
    assert_eq!(rig.broker.subscriber_count("playback_replication-events"), 2);
    Ok(())
}

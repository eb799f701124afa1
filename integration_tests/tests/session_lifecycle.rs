//! Connection lifecycle: shutdown, transport loss and restart

use std::time::Duration;

mod common;
use common::{Rig, init_logging, reach, test_config};
use playsync::state::EventFilter;
use playsync::testing::NetworkSimulator;
use playsync::transport::memory::MemoryBroker;
use playsync::{PairingState, PlaybackSession, SessionEvent};

#[tokio::test(start_paused = true)]
async fn test_controller_shutdown_leaves_display_paired() -> anyhow::Result<()> {
    init_logging();
    let rig = Rig::start("lifecycle-shutdown", NetworkSimulator::perfect()).await;

    rig.controller.shutdown();
    reach(rig.controller.subscribe_view(), |v| v.pairing == PairingState::Disconnected).await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // No liveness detection: the display keeps its binding
    assert!(rig.display.view().await.pairing.is_paired());
    assert_eq!(rig.broker.subscriber_count("playback_lifecycle-shutdown"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_display_shutdown_emits_disconnect() -> anyhow::Result<()> {
    init_logging();
    let rig = Rig::start("lifecycle-display", NetworkSimulator::perfect()).await;
    let mut lifecycle = EventFilter::pairing_events(rig.display.event_bus());

    rig.display.shutdown();

    let mut saw = Vec::new();
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_secs(1), lifecycle.recv()).await
    {
        saw.push(event);
    }
    assert!(saw.iter().any(|e| matches!(e, SessionEvent::Disconnected { .. })));
    assert!(saw.iter().any(|e| matches!(
        e,
        SessionEvent::PairingChanged {
            new: PairingState::Disconnected,
            ..
        }
    )));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_fresh_sessions_pair_again_after_restart() -> anyhow::Result<()> {
    init_logging();
    let broker = MemoryBroker::new();

    for round in 0..2 {
        let (transport, events) = broker.transport();
        let (session, display) =
            PlaybackSession::display(test_config("lifecycle-restart"), transport, events);
        let display_task = tokio::spawn(session.run());
        reach(display.subscribe_view(), |v| v.pairing == PairingState::Unpaired).await;

        let (transport, events) = broker.transport();
        let (session, controller) =
            PlaybackSession::controller(test_config("lifecycle-restart"), transport, events);
        let controller_task = tokio::spawn(session.run());
        reach(controller.subscribe_view(), |v| v.pairing.is_paired()).await;
        tracing::info!(round, "paired");

        controller.shutdown();
        display.shutdown();
        controller_task.await??;
        display_task.await??;
        assert_eq!(broker.subscriber_count("playback_lifecycle-restart"), 0);
    }
    Ok(())
}

//! Controller and display paired over an in-process broker
//!
//! Run with `RUST_LOG=playsync=debug` to watch the handshake and heartbeat.

use std::time::Duration;

use playsync::testing::{NetworkSimulator, SimulatedMedia};
use playsync::transport::memory::MemoryBroker;
use playsync::{MediaElement, PlaybackSession, SessionConfig, SessionEvent, SystemClock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playsync=info")),
        )
        .init();

    let broker = MemoryBroker::with_simulator(NetworkSimulator::broadband());
    let config = SessionConfig::builder().channel_id("loopback").build();

    // Display first: the controller announces once
    let (transport, events) = broker.transport();
    let (session, display) = PlaybackSession::display(config.clone(), transport, events);
    tokio::spawn(session.run());

    let mut media = SimulatedMedia::new(SystemClock::shared(), display.media_sink())
        .with_source_duration(95.0);
    media.set_source("https://example.com/trailer.mp4");
    display.attach_media(media)?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (transport, events) = broker.transport();
    let (session, controller) = PlaybackSession::controller(config, transport, events);
    let mut lifecycle = controller.events();
    tokio::spawn(session.run());

    while let Ok(event) = lifecycle.recv().await {
        if let SessionEvent::Paired { peer } = event {
            println!("Paired with display {peer}");
            break;
        }
    }

    controller.toggle_playback().await?;
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let view = controller.view().await;
        println!(
            "{} ({:?}, offset {:.1}ms)",
            view.display_time(),
            view.snapshot.playback_state,
            view.estimate_ms
        );
    }

    controller.seek_forward().await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("After seek: {}", controller.view().await.display_time());

    controller.toggle_playback().await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("Paused at {}", controller.view().await.display_time());

    // Cleanup
    controller.shutdown();
    display.shutdown();
    Ok(())
}

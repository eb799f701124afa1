use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{ControllerHandle, DisplayHandle, PlaybackSession};
use crate::clock::SystemClock;
use crate::error::{PlaysyncError, Result};
use crate::media::MediaElement;
use crate::pairing::PairingState;
use crate::state::SessionEvent;
use crate::testing::SimulatedMedia;
use crate::transport::Transport;
use crate::transport::memory::{MemoryBroker, MemoryTransport};
use crate::types::{Command, PlaybackState, SessionConfig};

fn config() -> SessionConfig {
    SessionConfig::builder().channel_id("session-tests").build()
}

async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("session dropped")
        .clone()
}

fn spawn_display(broker: &MemoryBroker) -> (DisplayHandle, JoinHandle<Result<()>>) {
    let (transport, events) = broker.transport();
    let (session, handle) = PlaybackSession::display(config(), transport, events);
    (handle, tokio::spawn(session.run()))
}

fn spawn_controller(broker: &MemoryBroker) -> (ControllerHandle, JoinHandle<Result<()>>) {
    let (transport, events) = broker.transport();
    let (session, handle) = PlaybackSession::controller(config(), transport, events);
    (handle, tokio::spawn(session.run()))
}

/// Display (with a loaded media element) and controller, paired
async fn paired(broker: &MemoryBroker) -> (ControllerHandle, DisplayHandle, SimulatedMedia) {
    let (display, _) = spawn_display(broker);
    let mut media = SimulatedMedia::new(SystemClock::shared(), display.media_sink())
        .with_source_duration(600.0);
    media.set_source("https://example.com/film.mp4");
    display.attach_media(media.clone()).unwrap();
    wait_for(&mut display.subscribe_view(), |v| v.pairing == PairingState::Unpaired).await;

    let (controller, _) = spawn_controller(broker);
    wait_for(&mut controller.subscribe_view(), |v| v.pairing == PairingState::Paired).await;
    wait_for(&mut display.subscribe_view(), |v| v.pairing == PairingState::Paired).await;
    (controller, display, media)
}

#[tokio::test(start_paused = true)]
async fn test_sessions_pair_over_broker() {
    let broker = MemoryBroker::new();

    let (controller, display, _media) = paired(&broker).await;

    let controller_view = controller.view().await;
    let display_view = display.view().await;
    assert!(controller_view.controls_enabled());
    assert!(display_view.shows_media());
    assert!(controller_view.peer.is_some());
    assert_ne!(controller_view.peer, display_view.peer);
}

#[tokio::test(start_paused = true)]
async fn test_command_refused_until_paired() {
    let broker = MemoryBroker::new();
    let (controller, _task) = spawn_controller(&broker);

    let err = controller.command(Command::TogglePlayback).await.unwrap_err();

    assert!(matches!(err, PlaysyncError::NotPaired { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_playback_round_trip() {
    let broker = MemoryBroker::new();
    let (controller, _display, media) = paired(&broker).await;
    let mut view = controller.subscribe_view();

    controller.toggle_playback().await.unwrap();
    wait_for(&mut view, |v| v.is_playing()).await;
    assert!(!media.is_paused());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let advanced = controller.view().await;
    assert!((advanced.position() - 2.0).abs() <= 0.3, "{}", advanced.position());

    controller.seek_forward().await.unwrap();
    let seeked = wait_for(&mut view, |v| v.position() >= 11.5).await;
    assert!(seeked.position() < 12.6);
    assert!((media.position_state().position - 12.0).abs() <= 0.3);

    controller.toggle_playback().await.unwrap();
    let paused = wait_for(&mut view, |v| v.snapshot.playback_state == PlaybackState::Paused).await;
    assert!(media.is_paused());
    assert!((paused.position() - media.position_state().position).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_load_source_resets_position() {
    let broker = MemoryBroker::new();
    let (controller, _display, media) = paired(&broker).await;
    let mut view = controller.subscribe_view();
    controller.toggle_playback().await.unwrap();
    wait_for(&mut view, |v| v.is_playing()).await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    controller.load_source("https://example.com/next.mp4").await.unwrap();

    let reloaded = wait_for(&mut view, |v| !v.is_playing()).await;
    assert_eq!(media.source().as_deref(), Some("https://example.com/next.mp4"));
    assert_eq!(reloaded.position(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_disconnects_and_resets() {
    let broker = MemoryBroker::new();
    let (controller, task) = spawn_controller(&broker);
    let mut view = controller.subscribe_view();
    wait_for(&mut view, |v| v.pairing == PairingState::Unpaired).await;
    let mut events = controller.events();

    controller.shutdown();
    task.await.unwrap().unwrap();

    assert_eq!(broker.subscriber_count("playback_session-tests"), 0);
    assert_eq!(controller.view().await.pairing, PairingState::Disconnected);
    assert!(!controller.is_running());
    let mut saw_disconnect = false;
    while let Ok(event) = events.try_recv() {
        saw_disconnect |= matches!(event, SessionEvent::Disconnected { .. });
    }
    assert!(saw_disconnect);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_session() {
    let broker = MemoryBroker::new();
    let (display, task) = spawn_display(&broker);
    wait_for(&mut display.subscribe_view(), |v| v.pairing == PairingState::Unpaired).await;

    drop(display);

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("session did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_transport_loss_resets_controller() {
    let broker = MemoryBroker::new();
    let (display, _) = spawn_display(&broker);
    wait_for(&mut display.subscribe_view(), |v| v.pairing == PairingState::Unpaired).await;

    let (transport, events) = broker.transport();
    let transport: Arc<MemoryTransport> = Arc::new(transport);
    let (session, controller) =
        PlaybackSession::controller(config(), Arc::clone(&transport), events);
    tokio::spawn(session.run());
    let mut view = controller.subscribe_view();
    wait_for(&mut view, |v| v.pairing == PairingState::Paired).await;

    transport.sever("server restart");

    let reset = wait_for(&mut view, |v| v.pairing == PairingState::Disconnected).await;
    assert_eq!(reset.estimate_ms, 0.0);
    assert_eq!(reset.snapshot.playback_state, PlaybackState::None);
    assert!(reset.peer.is_none());
    assert!(matches!(
        controller.command(Command::TogglePlayback).await,
        Err(PlaysyncError::NotPaired { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_commands_after_stop_fail() {
    let broker = MemoryBroker::new();
    let (controller, task) = spawn_controller(&broker);
    controller.shutdown();
    task.await.unwrap().unwrap();

    let err = controller.seek_backward().await.unwrap_err();
    assert!(matches!(err, PlaysyncError::ChannelClosed));
}

/// Transport that accepts every call and never reports anything
struct SilentTransport;

#[async_trait]
impl Transport for SilentTransport {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&self, _channel: &str) -> Result<()> {
        Ok(())
    }

    async fn unsubscribe(&self, _channel: &str) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, _channel: &str, _data: Value) -> Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_closed_event_stream_reports_disconnect() {
    let (events_tx, events) = mpsc::unbounded_channel();
    drop(events_tx);
    let (session, controller) = PlaybackSession::controller(config(), SilentTransport, events);

    let err = session.run().await.unwrap_err();

    assert!(matches!(err, PlaysyncError::Disconnected { .. }));
    assert!(err.is_connection_lost());
    drop(controller);
}

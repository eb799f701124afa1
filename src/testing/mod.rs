//! Test doubles for the external collaborators: clock, channel conditions
//! and media element.

pub mod manual_clock;
pub mod network_sim;
pub mod simulated_media;

pub use manual_clock::ManualClock;
pub use network_sim::NetworkSimulator;
pub use simulated_media::SimulatedMedia;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::media::MediaEvent;

/// Helper to create a simulated media element on a manual clock.
///
/// Returns the element and the receiver its events are reported on.
#[must_use]
pub fn create_test_media(
    clock: &ManualClock,
) -> (SimulatedMedia, mpsc::UnboundedReceiver<MediaEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SimulatedMedia::new(Arc::new(clock.clone()), tx), rx)
}

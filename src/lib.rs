//! # playsync
//!
//! Remote playback control between two peers sharing a publish/subscribe
//! channel: a **controller** that issues commands and shows a smoothly
//! advancing position, and a **display** that owns the media element.
//!
//! ## Features
//!
//! - Two-role discovery handshake binding exactly one controller to one display
//! - Clock offset estimation by repeated round-trip sampling
//! - Change-triggered playback snapshots from the display
//! - Position extrapolation on the controller between snapshots
//!
//! ## Example
//!
//! ```rust,no_run
//! use playsync::transport::memory::MemoryBroker;
//! use playsync::{PlaybackSession, SessionConfig};
//!
//! # async fn example() -> Result<(), playsync::PlaysyncError> {
//! let broker = MemoryBroker::new();
//! let (transport, events) = broker.transport();
//!
//! let config = SessionConfig::builder().channel_id("living-room").build();
//! let (session, handle) = PlaybackSession::controller(config, transport, events);
//! tokio::spawn(session.run());
//!
//! // Fails with `NotPaired` until a display has answered
//! handle.toggle_playback().await?;
//! println!("{}", handle.view().await.display_time());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Driver**: [`PlaybackSession`] - async loop owning transport, timers and view state
//! - **Peers**: [`peer::ControllerPeer`] / [`peer::DisplayPeer`] - sans-IO role state machines
//! - **Components**: pairing, clock sync, replication and position estimation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// State management
pub mod state;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod clock;
pub mod media;
pub mod pairing;
pub mod peer;
pub mod position;
pub mod protocol;
pub mod replication;
mod session;
pub mod timer;
pub mod transport;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use error::PlaysyncError;
pub use media::{MediaElement, MediaEvent};
pub use pairing::{PairingCoordinator, PairingState};
pub use protocol::Message;
pub use session::{ControllerHandle, DisplayHandle, PlaybackSession};
pub use state::{ControllerView, DisplayView, SessionEvent, StateContainer};
pub use types::{
    ClientId, Command, PlaybackSnapshot, PlaybackState, PositionState, Role, SessionConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        Command, ControllerHandle, ControllerView, DisplayHandle, DisplayView, MediaElement,
        MediaEvent, PairingState, PlaybackSession, PlaybackState, PlaysyncError, PositionState,
        Role, SessionConfig,
    };
}

//! Core types module

mod config;
mod session;
mod state;


pub use config::{DiscoveryRetry, SessionConfig, SessionConfigBuilder};
pub use session::{ClientId, Command, Role, Session};
pub use state::{PlaybackSnapshot, PlaybackState, PositionState};

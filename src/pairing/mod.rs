//! Two-role discovery handshake
//!
//! Binds exactly one controller and one display sharing a channel.
//!
//! ```text
//! Disconnected -> Connecting -> Unpaired -> Paired
//!       ^______________|___________|__________|   (transport loss)
//! ```

mod coordinator;

#[cfg(test)]
mod tests;

pub use coordinator::{PairingCoordinator, PairingOutcome, PairingState, PeerBinding, Rejection};

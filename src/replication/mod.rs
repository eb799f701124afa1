//! Playback state replication
//!
//! The display publishes one snapshot per state-affecting media event and
//! never re-broadcasts periodically, so display-to-controller traffic grows
//! with the number of events, not with time. The controller stores the most
//! recent snapshot (no history), translating its timestamp into local time.

mod controller;
mod display;


pub use controller::{SnapshotIngest, corrected_origin};
pub use display::{CommandOutcome, DisplayReplicator};

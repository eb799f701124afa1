//! Publish/subscribe transport seam
//!
//! The transport itself (connection lifecycle, subscriptions, delivery,
//! sender tagging) is an external collaborator. The protocol consumes it
//! through [`Transport`] and the [`TransportEvent`] stream.

mod traits;

pub mod memory;


pub use traits::{ConnectInfo, DisconnectInfo, Transport, TransportEvent, TransportEvents};

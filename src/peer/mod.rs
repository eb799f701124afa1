//! Sans-IO role state machines
//!
//! A peer consumes transport events, timer expirations and local inputs,
//! and answers with [`Action`]s for the session driver to carry out. Peers
//! never touch the transport or sleep themselves, so every protocol rule
//! can be exercised synchronously against a manual clock.

mod controller;
mod display;


pub use controller::{CommandRequest, ControllerPeer};
pub use display::{DisplayInput, DisplayPeer};

use serde_json::Value;

use crate::pairing::{PairingState, Rejection};
use crate::protocol::Message;
use crate::state::SessionEvent;
use crate::timer::TimerKind;
use crate::transport::TransportEvent;
use crate::types::{ClientId, Role};

/// Side effect requested by a peer
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Subscribe to the session channel
    Subscribe,
    /// Publish a message on the session channel
    Publish(Message),
    /// Close the transport connection
    Disconnect,
    /// The view changed and should be re-rendered
    Render,
    /// Notify event subscribers
    Emit(SessionEvent),
}

/// Role state machine driven by a session
pub trait Peer: Send {
    /// Rendered view type
    type View: Clone + Default + Send + Sync + 'static;

    /// Local input type (user commands, media notifications)
    type Input: Send + 'static;

    /// Local role
    fn role(&self) -> Role;

    /// Current pairing state
    fn pairing_state(&self) -> PairingState;

    /// The session is about to connect the transport
    fn begin_connect(&mut self) -> Vec<Action>;

    /// Handle one transport event
    fn handle_transport(&mut self, event: TransportEvent) -> Vec<Action>;

    /// Handle one local input
    fn handle_input(&mut self, input: Self::Input) -> Vec<Action>;

    /// Fire every timer whose deadline has passed
    fn handle_timers(&mut self) -> Vec<Action>;

    /// Earliest outstanding timer deadline (local monotonic ms)
    fn next_deadline(&self) -> Option<(TimerKind, f64)>;

    /// Snapshot of the view
    fn view(&self) -> Self::View;
}

/// Decode a publication payload; malformed payloads are discarded
pub(crate) fn decode(sender: &ClientId, data: Value) -> Result<Message, Rejection> {
    Message::from_value(data).map_err(|e| {
        tracing::trace!(sender = %sender, error = %e, "discarding malformed publication");
        Rejection::Malformed
    })
}

/// Log a discarded message
pub(crate) fn discard(role: Role, sender: &ClientId, kind: &str, rejection: &Rejection) {
    tracing::trace!(%role, sender = %sender, kind, ?rejection, "message discarded");
}

/// Append a `PairingChanged` event (and a render) if the state moved
pub(crate) fn pairing_changed(
    before: PairingState,
    after: PairingState,
    actions: &mut Vec<Action>,
) {
    if before != after {
        actions.push(Action::Emit(SessionEvent::PairingChanged {
            old: before,
            new: after,
        }));
        actions.push(Action::Render);
    }
}

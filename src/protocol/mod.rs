//! Wire protocol exchanged over the playback channel
//!
//! Every publication carries one JSON object tagged with a `kind`
//! discriminant. The sender identity is supplied by the transport and is
//! never part of the payload.
//!
//! ```text
//! Controller                         Display
//!   |--- discovery(controller, t_c) --->|
//!   |<-- discovery(display, t_d) -------|
//!   |<-- sync(t_d - t_c, t_d) ----------|
//!   |--- sync(estimate, now) ---------->|   (immediate reply)
//!   |<-- sync(estimate, now) -----------|   (250 ms heartbeat)
//!   |--- playback_state / seek / source>|
//!   |<-- state(snapshot, now) ----------|   (on media events)
//! ```

pub mod message;


pub use message::Message;

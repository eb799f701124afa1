//! Observable session state and events

mod container;
mod events;
mod view;

pub use container::StateContainer;
pub use events::{EventBus, EventFilter, SessionEvent};
pub use view::{ControllerView, DisplayView};

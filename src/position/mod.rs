//! Controller-side position extrapolation
//!
//! Between snapshots the controller advances the last known position by
//! the real elapsed time, scaled by the playback rate, on a fixed-interval
//! timer. The error is bounded by one tick interval and no network traffic
//! is needed per tick.

mod estimator;
mod format;


pub use estimator::{PositionEstimator, extrapolate};
pub use format::format_time;

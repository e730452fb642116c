//! Time-window policy and the background loop that enforces it.

mod timing;
mod window;

pub use timing::{enforce_window, TimingEnforcer};
pub use window::{is_within_window, Clock, LocalClock, TimeWindow};

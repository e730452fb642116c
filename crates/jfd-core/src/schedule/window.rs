//! Daily download window and the wall-clock source it is evaluated against.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Hour range during which transfers may run unpaused.
///
/// `start_hour < end_hour` is a same-day window; anything else wraps past
/// midnight. `start_hour == end_hour` therefore permits the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// True if `hour` (0-23) lies inside the window.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour < self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Whether transfers are permitted at `now`. Only the hour component is consulted.
pub fn is_within_window(window: &TimeWindow, now: &impl Timelike) -> bool {
    window.contains_hour(now.hour())
}

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Local time of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

impl<F> Clock for F
where
    F: Fn() -> NaiveTime + Send + Sync,
{
    fn now(&self) -> NaiveTime {
        self()
    }
}

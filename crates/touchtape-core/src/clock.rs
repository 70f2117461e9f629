//! Millisecond timestamps relative to process start.
//!
//! Device events carry wall-clock times; captured messages carry
//! milliseconds relative to a single epoch taken when the clock is
//! created. Using the same epoch for both keeps live event times and
//! replayed message times directly comparable.

use std::time::{SystemTime, UNIX_EPOCH};

/// Converts wall-clock time into a non-decreasing millisecond counter.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start_secs: i64,
    last: i64,
}

impl Clock {
    /// Create a clock with its epoch at the current wall-clock second.
    pub fn new() -> Self {
        let start_secs = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            // Clock before 1970: fall back to a zero epoch so timestamps
            // stay raw wall-clock milliseconds.
            Err(_) => 0,
        };
        Self::with_epoch(start_secs)
    }

    pub(crate) fn with_epoch(start_secs: i64) -> Self {
        Self {
            start_secs,
            last: 0,
        }
    }

    /// Convert an event time (seconds + microseconds of wall-clock time)
    /// into milliseconds relative to the epoch.
    pub fn timestamp(&self, secs: i64, micros: i64) -> i64 {
        (secs - self.start_secs) * 1000 + micros / 1000
    }

    /// Milliseconds elapsed since the epoch, never moving backwards even
    /// if the wall clock does.
    pub fn now(&mut self) -> i64 {
        let raw = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => self.timestamp(elapsed.as_secs() as i64, elapsed.subsec_micros() as i64),
            Err(_) => 0,
        };
        self.last = self.last.max(raw);
        self.last
    }

    /// The epoch itself, in wall-clock milliseconds.
    pub fn start_ms(&self) -> i64 {
        self.start_secs * 1000
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

//! Game timer state structure and management

use chrono::{DateTime, Utc};

/// Elapsed-time display for the active game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTimerState {
    /// Authoritative game start, as reported by the backend
    pub start_time: Option<DateTime<Utc>>,
    /// `minutes:seconds`, derived from `start_time`
    pub elapsed_time: String,
}

impl GameTimerState {
    /// Create a timer state with no known start time
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed_time: convert_seconds(0),
        }
    }

    /// Recompute the elapsed time against `now`.
    ///
    /// Returns false and leaves the display untouched when there is no start
    /// time. A start time in the future reads as zero.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> bool {
        let Some(start) = self.start_time else {
            return false;
        };
        let seconds = (now - start).num_seconds().max(0) as u64;
        self.elapsed_time = convert_seconds(seconds);
        true
    }
}

impl Default for GameTimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration as `minutes:seconds`.
///
/// Seconds are zero-padded to two digits, minutes are not padded and are not
/// folded into hours.
pub fn convert_seconds(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

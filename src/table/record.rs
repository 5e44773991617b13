use serde::{Deserialize, Serialize};

/// One counter record per (credential, endpoint) pair.
///
/// `reset_at` marks the end of the current window in epoch milliseconds.
/// It is absent until the first increment creates the window and is only
/// removed by an explicit clear; readers treat an elapsed value as if the
/// record did not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Requests counted in the current window. Never negative.
    pub hits: u64,
    /// End of the current window, epoch milliseconds.
    pub reset_at: Option<u64>,
}

impl CounterRecord {
    /// A record with no hits and no active window.
    pub fn empty() -> Self {
        Self {
            hits: 0,
            reset_at: None,
        }
    }

    /// Whether the record's window has elapsed as of `now_ms`.
    ///
    /// A record without a `reset_at` has no active window and counts
    /// as elapsed.
    pub fn elapsed(&self, now_ms: u64) -> bool {
        match self.reset_at {
            Some(reset_at) => reset_at <= now_ms,
            None => true,
        }
    }
}

//! Wall-clock helpers for window arithmetic.
//!
//! All window math is done in epoch milliseconds; response headers carry
//! epoch seconds, rounded up so a reset never appears to be in the past.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Convert epoch milliseconds to epoch seconds, rounding up.
pub fn ceil_to_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

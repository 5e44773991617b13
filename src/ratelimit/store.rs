//! Window-scoped counter store layered over the shared counter table.
//!
//! The store owns the fixed-window semantics: window rollover, the clamp
//! that keeps reset deadlines ahead of skewed clocks, and the fail-open
//! fallbacks that keep table faults away from request handling. The table
//! operations themselves stay dumb and atomic.

use crate::table::CounterTable;
use crate::utils::time::epoch_ms;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Post-increment view of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Requests counted in the current window, including this one.
    pub total_hits: u64,
    /// End of the current window, epoch milliseconds.
    pub reset_at_ms: u64,
}

/// Fixed-window counter store.
///
/// Cheap to clone; clones share the same underlying table. Safe to use
/// from many processes concurrently as long as the table's operations are
/// atomic per key.
#[derive(Clone)]
pub struct WindowedCounterStore {
    table: Arc<dyn CounterTable>,
    window_ms: u64,
}

impl WindowedCounterStore {
    pub fn new(table: Arc<dyn CounterTable>, window: Duration) -> Self {
        Self {
            table,
            window_ms: (window.as_millis() as u64).max(1),
        }
    }

    /// The window length in milliseconds.
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Fetch the active-window snapshot for a key.
    ///
    /// Returns `None` when no record exists, when the recorded window has
    /// elapsed, or when the table fails (logged, treated as no active
    /// window). The returned reset deadline is clamped to at least
    /// `now + window` so skewed writer clocks never surface a deadline in
    /// the past.
    pub async fn get(&self, key: &str) -> Option<CounterSnapshot> {
        let record = match self.table.get(key).await {
            Ok(record) => record?,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read counter record");
                return None;
            }
        };

        let now = epoch_ms();
        if record.elapsed(now) {
            debug!(key = %key, "Window elapsed, treating counter as absent");
            return None;
        }

        let reset_at_ms = record
            .reset_at
            .unwrap_or(0)
            .max(now + self.window_ms);

        Some(CounterSnapshot {
            total_hits: record.hits,
            reset_at_ms,
        })
    }

    /// Count one request against a key, starting a fresh window if none
    /// is active.
    ///
    /// When the table hands back a record whose window has already
    /// elapsed, the stale record is cleared and the increment reapplied so
    /// the new window starts at one hit. A concurrent incrementer racing
    /// that clear can land the fresh window at two hits; either total is
    /// acceptable, the counter never loses this request.
    ///
    /// Table failures are logged and converted into a snapshot of one hit
    /// in a fresh window: the request is allowed through and shared state
    /// is left untouched.
    pub async fn increment(&self, key: &str) -> CounterSnapshot {
        let now = epoch_ms();
        let init_reset_at = now + self.window_ms;

        let record = match self.table.upsert_add(key, init_reset_at).await {
            Ok(record) => record,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to increment counter, failing open");
                return CounterSnapshot {
                    total_hits: 1,
                    reset_at_ms: init_reset_at,
                };
            }
        };

        let record = if record.elapsed(now) {
            debug!(key = %key, "Window elapsed, starting a new one");
            self.reset_key(key).await;
            match self.table.upsert_add(key, init_reset_at).await {
                Ok(record) => record,
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to restart window, failing open");
                    return CounterSnapshot {
                        total_hits: 1,
                        reset_at_ms: init_reset_at,
                    };
                }
            }
        } else {
            record
        };

        CounterSnapshot {
            total_hits: record.hits,
            reset_at_ms: record.reset_at.unwrap_or(init_reset_at),
        }
    }

    /// Roll back one counted request, e.g. when downstream handling failed
    /// in a way that should not consume quota.
    ///
    /// Saturates at zero; a counter already at zero is the expected case
    /// and not an error.
    pub async fn decrement(&self, key: &str) {
        match self.table.decrement_if_positive(key).await {
            Ok(applied) => {
                if !applied {
                    debug!(key = %key, "Counter already at zero, decrement skipped");
                }
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to decrement counter");
            }
        }
    }

    /// End the current window early, zeroing the counter.
    pub async fn reset_key(&self, key: &str) {
        if let Err(e) = self.table.clear(key).await {
            error!(key = %key, error = %e, "Failed to reset counter");
        }
    }
}

//! Counter table abstractions with multiple backend implementations.
//!
//! The counter table is the single point of synchronization between request
//! processes: every mutation is a single atomic server-side operation, so
//! concurrent incrementers never lose an update. An in-memory backend is
//! provided by default, with optional Redis support via the `table-redis`
//! feature.

mod in_memory;
mod record;

#[cfg(feature = "table-redis")]
mod redis;

pub use in_memory::InMemoryTable;
pub use record::CounterRecord;

#[cfg(feature = "table-redis")]
pub use redis::RedisTable;

use crate::error::Result;
use async_trait::async_trait;

/// Key-value counter table.
///
/// Implementations must guarantee that each operation is atomic with respect
/// to concurrent callers on the same key. A read-modify-write implementation
/// built from separate get and put calls is incorrect under concurrency.
#[async_trait]
pub trait CounterTable: Send + Sync {
    /// Fetch the record for a key.
    ///
    /// Returns `Ok(None)` when no record exists. Malformed or partial
    /// records are reported as absent, not as errors.
    async fn get(&self, key: &str) -> Result<Option<CounterRecord>>;

    /// Atomic conditional upsert with arithmetic increment.
    ///
    /// Adds 1 to `hits`, creating the record with `hits = 1` if absent.
    /// `reset_at` is initialized to `init_reset_at_ms` only when the record
    /// does not already carry one. Returns the post-update record.
    async fn upsert_add(&self, key: &str, init_reset_at_ms: u64) -> Result<CounterRecord>;

    /// Conditional update: subtract 1 from `hits` only when `hits > 0`.
    ///
    /// Returns whether the update applied. An unmet precondition is the
    /// normal already-at-zero case, not an error.
    async fn decrement_if_positive(&self, key: &str) -> Result<bool>;

    /// Set `hits` to 0 and remove `reset_at`, ending the window early.
    async fn clear(&self, key: &str) -> Result<()>;
}

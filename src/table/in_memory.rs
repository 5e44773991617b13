//! In-memory counter table backed by DashMap.
//!
//! The entry API holds a per-shard write lock for the duration of each
//! mutation, which gives the atomic conditional-upsert semantics the
//! `CounterTable` contract requires without a global lock. Suitable for
//! single-process deployments and tests; multi-process deployments share
//! state through the Redis backend instead.

use crate::error::Result;
use crate::table::{CounterRecord, CounterTable};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory counter table.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryTable {
    records: Arc<DashMap<String, CounterRecord>>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, including retired windows that
    /// have not been cleared yet.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CounterTable for InMemoryTable {
    async fn get(&self, key: &str) -> Result<Option<CounterRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn upsert_add(&self, key: &str, init_reset_at_ms: u64) -> Result<CounterRecord> {
        let mut entry = self
            .records
            .entry(key.to_string())
            .or_insert_with(CounterRecord::empty);

        entry.hits += 1;
        if entry.reset_at.is_none() {
            entry.reset_at = Some(init_reset_at_ms);
        }

        Ok(entry.value().clone())
    }

    async fn decrement_if_positive(&self, key: &str) -> Result<bool> {
        match self.records.get_mut(key) {
            Some(mut entry) if entry.hits > 0 => {
                entry.hits -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let mut entry = self
            .records
            .entry(key.to_string())
            .or_insert_with(CounterRecord::empty);
        entry.hits = 0;
        entry.reset_at = None;
        Ok(())
    }
}

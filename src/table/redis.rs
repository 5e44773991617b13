use crate::error::{QuotagateError, Result};
use crate::table::{CounterRecord, CounterTable};
use async_trait::async_trait;
use redis::Script;
use tracing::warn;

/// Redis-backed counter table.
///
/// Each key maps to a hash with `hits` and `reset_at` fields. The
/// conditional mutations run as Lua scripts so they stay single atomic
/// server-side operations even with many API processes sharing the table.
#[derive(Clone)]
pub struct RedisTable {
    client: redis::Client,
}

/// HINCRBY creates the hash if absent; `reset_at` is only written when the
/// record does not already carry one (the window stays anchored to the
/// first increment that created it).
const UPSERT_ADD_SCRIPT: &str = r#"
local hits = redis.call('HINCRBY', KEYS[1], 'hits', 1)
local reset = redis.call('HGET', KEYS[1], 'reset_at')
if not reset then
  redis.call('HSET', KEYS[1], 'reset_at', ARGV[1])
  reset = ARGV[1]
end
return {hits, reset}
"#;

/// Decrement only while hits > 0; an unmet precondition returns 0.
const DECREMENT_SCRIPT: &str = r#"
local hits = tonumber(redis.call('HGET', KEYS[1], 'hits'))
if hits and hits > 0 then
  redis.call('HINCRBY', KEYS[1], 'hits', -1)
  return 1
end
return 0
"#;

impl RedisTable {
    /// Create a new Redis counter table from a connection URL
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| QuotagateError::table(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self { client })
    }

    /// Get a connection from the Redis client
    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QuotagateError::table(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl CounterTable for RedisTable {
    async fn get(&self, key: &str) -> Result<Option<CounterRecord>> {
        let mut conn = self.get_connection().await?;

        let (hits, reset_at): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(key)
            .arg("hits")
            .arg("reset_at")
            .query_async(&mut conn)
            .await
            .map_err(|e| QuotagateError::table(format!("Redis HMGET failed: {}", e)))?;

        let Some(hits) = hits else {
            return Ok(None);
        };

        // A record we cannot parse is reported as absent so the caller
        // starts a fresh window instead of failing the request.
        let Ok(hits) = hits.parse::<u64>() else {
            warn!(key = %key, "Malformed hits field in counter record, treating as absent");
            return Ok(None);
        };
        let reset_at = match reset_at {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!(key = %key, "Malformed reset_at field in counter record, treating as absent");
                    return Ok(None);
                }
            },
            None => None,
        };

        Ok(Some(CounterRecord { hits, reset_at }))
    }

    async fn upsert_add(&self, key: &str, init_reset_at_ms: u64) -> Result<CounterRecord> {
        let mut conn = self.get_connection().await?;

        let (hits, reset_at): (u64, u64) = Script::new(UPSERT_ADD_SCRIPT)
            .key(key)
            .arg(init_reset_at_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| QuotagateError::table(format!("Redis increment failed: {}", e)))?;

        Ok(CounterRecord {
            hits,
            reset_at: Some(reset_at),
        })
    }

    async fn decrement_if_positive(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        let applied: u8 = Script::new(DECREMENT_SCRIPT)
            .key(key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| QuotagateError::table(format!("Redis decrement failed: {}", e)))?;

        Ok(applied == 1)
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(key)
            .arg("hits")
            .arg(0)
            .ignore()
            .cmd("HDEL")
            .arg(key)
            .arg("reset_at")
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| QuotagateError::table(format!("Redis clear failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running Redis instance
    // They're ignored by default but can be enabled for integration testing

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_table_round_trip() {
        let table = RedisTable::new("redis://127.0.0.1/").unwrap();
        table.clear("quotagate-test").await.unwrap();

        let record = table.upsert_add("quotagate-test", 5_000).await.unwrap();
        assert_eq!(record.hits, 1);
        assert_eq!(record.reset_at, Some(5_000));

        let record = table.upsert_add("quotagate-test", 9_999).await.unwrap();
        assert_eq!(record.hits, 2);
        assert_eq!(record.reset_at, Some(5_000));

        assert!(table.decrement_if_positive("quotagate-test").await.unwrap());

        table.clear("quotagate-test").await.unwrap();
        let record = table.get("quotagate-test").await.unwrap().unwrap();
        assert_eq!(record.hits, 0);
        assert_eq!(record.reset_at, None);
        assert!(!table.decrement_if_positive("quotagate-test").await.unwrap());
    }
}

//! Redis Counting Store
//!
//! Sliding-window attempts kept in one sorted set per key, scored by
//! timestamp. A Lua script runs evict, count, conditional add, expire and
//! read-oldest as one atomic step, so concurrent callers on any number of
//! server instances can never admit more than the limit.

use platform::rate_limit::{RateLimitStore, StoreError, WindowSnapshot};
use redis::Script;
use redis::aio::ConnectionManager;
use uuid::Uuid;

const SLIDING_WINDOW_SCRIPT: &str = r"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local member = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local admitted = 0
if count < limit then
  redis.call('ZADD', key, now, member)
  redis.call('PEXPIRE', key, window)
  count = count + 1
  admitted = 1
end

local oldest = -1
local first = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if first[2] then
  oldest = tonumber(first[2])
end
return {admitted, count, oldest}
";

/// Redis-backed rate limit store
#[derive(Clone)]
pub struct RedisRateLimitStore {
    connection: ConnectionManager,
    script: Script,
}

impl RedisRateLimitStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }

    /// Open a managed connection to `redis_url`
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self::new(connection))
    }
}

impl RateLimitStore for RedisRateLimitStore {
    async fn record_attempt(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        limit: u32,
    ) -> Result<WindowSnapshot, StoreError> {
        let mut connection = self.connection.clone();
        // Two attempts in the same millisecond must stay distinct members
        let member = format!("{}-{}", now_ms, Uuid::new_v4());

        let (admitted, count, oldest): (i64, i64, i64) = self
            .script
            .key(key)
            .arg(now_ms)
            .arg(window_ms)
            .arg(limit)
            .arg(member)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        snapshot_from_reply(admitted, count, oldest)
    }
}

fn snapshot_from_reply(admitted: i64, count: i64, oldest: i64) -> Result<WindowSnapshot, StoreError> {
    let count = u32::try_from(count)
        .map_err(|_| StoreError::Protocol(format!("negative or oversized count {}", count)))?;
    Ok(WindowSnapshot {
        admitted: admitted == 1,
        count,
        oldest_ms: (oldest >= 0).then_some(oldest),
    })
}

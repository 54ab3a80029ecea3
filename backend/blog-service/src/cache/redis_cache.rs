use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;
use tracing::{debug, warn};

use super::{PageCache, PAGE_KEY_PREFIX};
use crate::error::{AppError, Result};

/// Page cache backed by Redis `SETEX` entries.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: ConnectionManager,
    ttl: Duration,
}

impl RedisPageCache {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self {
            redis,
            ttl: Duration::from_secs(ttl_secs),
        }
    }
}

#[async_trait::async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        conn.get::<_, Option<String>>(key).await.map_err(|e| {
            warn!("Redis read error for page cache: {}", e);
            AppError::Cache(e.to_string())
        })
    }

    async fn set(&self, key: &str, body: &str) -> Result<()> {
        // SETEX rejects a zero expiry.
        let ttl_secs = self.ttl.as_secs().max(1);

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, body, ttl_secs)
            .await
            .map_err(|e| {
                warn!("Failed to write page cache: {}", e);
                AppError::Cache(e.to_string())
            })?;

        debug!("Page cache WRITE {} with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(key).await?;

        debug!("Page cache INVALIDATE {}", key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let pattern = format!("{}*", PAGE_KEY_PREFIX);
        let mut conn = self.redis.clone();

        let keys: Vec<String> = {
            let mut iter = conn.scan_match::<_, String>(&pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await?;
        }

        debug!("Page cache CLEAR removed {} entries", keys.len());
        Ok(())
    }
}

//! Page cache for rendered feed responses.
//!
//! Only the index feed is cached. Entries live for a fixed TTL and are never
//! invalidated by writes, so a new or deleted post shows up on `/` once the
//! entry expires or the cache is cleared.

mod memory;
mod redis_cache;

pub use memory::MemoryPageCache;
pub use redis_cache::RedisPageCache;

use crate::error::Result;

const PAGE_KEY_PREFIX: &str = "blog:page:v1:";

/// Cache key of a rendered page: request path plus query string.
pub fn page_key(path: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{}{}", PAGE_KEY_PREFIX, path)
    } else {
        format!("{}{}?{}", PAGE_KEY_PREFIX, path, query)
    }
}

#[async_trait::async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a rendered body for the cache's configured TTL.
    async fn set(&self, key: &str, body: &str) -> Result<()>;

    async fn invalidate(&self, key: &str) -> Result<()>;

    /// Drop every cached page.
    async fn clear(&self) -> Result<()>;
}

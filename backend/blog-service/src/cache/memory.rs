use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::PageCache;
use crate::error::Result;

struct Entry {
    body: String,
    expires_at: Instant,
}

/// Process-local page cache. Expired entries are dropped on read and swept on
/// every write.
pub struct MemoryPageCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl MemoryPageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.body.clone()));
            }
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, body: &str) -> Result<()> {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.to_string(),
            Entry {
                body: body.to_string(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

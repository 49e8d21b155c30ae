//! Redis-backed cache shared across server instances

use airfleet_core::{CacheStore, FleetError, Result};
use anyhow::Context;
use async_trait::async_trait;
use redis::AsyncCommands;

pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

fn cache_err(e: redis::RedisError) -> FleetError {
    FleetError::Cache(e.to_string())
}

impl RedisCache {
    /// Connect to `redis_url` (e.g., "redis://127.0.0.1:6379")
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)
            .with_context(|| format!("Invalid Redis URL: {}", redis_url))?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .with_context(|| format!("Failed to connect to Redis at {}", redis_url))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_err)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set(key, value).await.map_err(cache_err)
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.del(keys.to_vec()).await.map_err(cache_err)
    }
}

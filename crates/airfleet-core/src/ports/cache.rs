//! Key-value cache port

use crate::Result;
use async_trait::async_trait;

/// String cache shared by every request
///
/// An absent key is `Ok(None)`; any `Err` means the cache itself failed.
/// Entries never expire on their own.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove keys; absent keys are ignored
    async fn delete(&self, keys: &[String]) -> Result<()>;
}

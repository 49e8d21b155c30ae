//! Cache-aside reads and invalidation over a [`CacheStore`]

use crate::error::{FleetError, Result};
use crate::keys::{CacheKey, Invalidation};
use crate::ports::CacheStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a read does when the cache itself fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheFailureMode {
    /// Fail the request
    #[default]
    Surface,
    /// Log and read from the store
    Bypass,
}

/// A loaded value and whether it came from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub value: T,
    pub hit: bool,
}

#[derive(Clone)]
pub struct CacheAside {
    cache: Arc<dyn CacheStore>,
    failure_mode: CacheFailureMode,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn CacheStore>, failure_mode: CacheFailureMode) -> Self {
        Self {
            cache,
            failure_mode,
        }
    }

    /// Cached value for `key`; an unreadable payload counts as a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let rendered = key.to_string();
        let raw = match self.cache.get(&rendered).await {
            Ok(raw) => raw,
            Err(e) => return self.on_read_failure(&rendered, e).map(|_| None),
        };
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding corrupt cache entry {}: {}", rendered, e);
                Ok(None)
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        let rendered = key.to_string();
        let payload = serde_json::to_string(value)?;
        match self.cache.set(&rendered, payload).await {
            Ok(()) => Ok(()),
            Err(e) => self.on_read_failure(&rendered, e),
        }
    }

    /// Drop every key in the set; failures always surface
    pub async fn invalidate(&self, set: &Invalidation) -> Result<()> {
        if set.is_empty() {
            return Ok(());
        }
        let keys = set.rendered();
        debug!("Invalidating {:?}", keys);
        self.cache.delete(&keys).await
    }

    /// Serve `key` from the cache, or load it and fill the cache
    ///
    /// Only successful loads are cached.
    pub async fn read_through<T, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<Lookup<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(key).await? {
            debug!("Cache hit: {}", key);
            return Ok(Lookup { value, hit: true });
        }
        debug!("Cache miss: {}", key);
        let value = loader().await?;
        self.put(key, &value).await?;
        Ok(Lookup { value, hit: false })
    }

    fn on_read_failure(&self, key: &str, err: FleetError) -> Result<()> {
        match self.failure_mode {
            CacheFailureMode::Surface => Err(err),
            CacheFailureMode::Bypass => {
                warn!("Cache unavailable for {}, reading through: {}", key, err);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use airfleet_types::{EntityKind, RecordId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DownCache;

    #[async_trait]
    impl CacheStore for DownCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(FleetError::Cache("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<()> {
            Err(FleetError::Cache("connection refused".to_string()))
        }

        async fn delete(&self, _keys: &[String]) -> Result<()> {
            Err(FleetError::Cache("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_read_through_fills_then_hits() {
        let memory = Arc::new(MemoryCache::new());
        let cache = CacheAside::new(memory.clone(), CacheFailureMode::Surface);
        let key = CacheKey::All(EntityKind::Engine);
        let loads = AtomicUsize::new(0);
        let loads = &loads;

        for expected_hit in [false, true] {
            let lookup = cache
                .read_through(&key, move || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["PT6A".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(lookup.hit, expected_hit);
            assert_eq!(lookup.value, vec!["PT6A".to_string()]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(memory.contains("engines"));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let memory = Arc::new(MemoryCache::new());
        let cache = CacheAside::new(memory.clone(), CacheFailureMode::Surface);
        let id = RecordId::generate();
        let key = CacheKey::Record(EntityKind::User, id);

        let result: Result<Lookup<String>> = cache
            .read_through(&key, || async move {
                Err(FleetError::not_found(EntityKind::User, id))
            })
            .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(memory.len(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_miss() {
        let memory = Arc::new(MemoryCache::new());
        memory.set("airlines", "{not json".to_string()).await.unwrap();
        let cache = CacheAside::new(memory, CacheFailureMode::Surface);
        let got: Option<Vec<String>> = cache.get(&CacheKey::All(EntityKind::Airline)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_failure_mode_decides_read_outcome() {
        let key = CacheKey::All(EntityKind::Aircraft);

        let surfacing = CacheAside::new(Arc::new(DownCache), CacheFailureMode::Surface);
        let err = surfacing
            .read_through(&key, || async { Ok(1u32) })
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::Cache(_)));

        let bypassing = CacheAside::new(Arc::new(DownCache), CacheFailureMode::Bypass);
        let lookup = bypassing
            .read_through(&key, || async { Ok(1u32) })
            .await
            .unwrap();
        assert_eq!(lookup.value, 1);
        assert!(!lookup.hit);

        let set = Invalidation::record(EntityKind::Aircraft, RecordId::generate());
        assert!(bypassing.invalidate(&set).await.is_err());
    }
}

#![allow(dead_code)]

use airfleet_core::{
    BestEffortSync, CacheFailureMode, CacheStore, Document, DocumentStore, Filter, FleetError,
    MemoryCache, MemoryStore, RecordId, Repositories, Result, Update,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Memory store that can fail or stall a chosen update call
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    updates: AtomicUsize,
    fail_update_at: Option<usize>,
    update_delay: Option<Duration>,
}

impl FlakyStore {
    /// Fail the `n`th update call (1-based)
    pub fn failing_update(n: usize) -> Self {
        Self {
            fail_update_at: Some(n),
            ..Default::default()
        }
    }

    pub fn slow_updates(delay: Duration) -> Self {
        Self {
            update_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.inner.find(collection, filter).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        self.inner.find_one(collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<RecordId> {
        self.inner.insert(collection, document).await
    }

    async fn update(&self, collection: &str, filter: &Filter, update: &Update) -> Result<u64> {
        let call = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_update_at == Some(call) {
            return Err(FleetError::Store(format!("injected failure on update {call}")));
        }
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.update(collection, filter, update).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.inner.delete(collection, filter).await
    }
}

/// Memory cache whose reads and writes can be switched off; deletes always work
#[derive(Default)]
pub struct FlakyCache {
    pub inner: MemoryCache,
    reads_down: AtomicBool,
}

impl FlakyCache {
    pub fn set_reads_down(&self, down: bool) {
        self.reads_down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.reads_down.load(Ordering::SeqCst) {
            return Err(FleetError::Cache("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        self.inner.delete(keys).await
    }
}

pub struct Harness<S> {
    pub store: Arc<S>,
    pub cache: Arc<FlakyCache>,
    pub repos: Repositories,
    pub sync: BestEffortSync,
}

pub fn harness_with<S: DocumentStore + 'static>(store: S, mode: CacheFailureMode) -> Harness<S> {
    let store = Arc::new(store);
    let cache = Arc::new(FlakyCache::default());
    let repos = Repositories::new(store.clone(), cache.clone(), mode);
    let sync = BestEffortSync::new(repos.clone());
    Harness {
        store,
        cache,
        repos,
        sync,
    }
}

pub fn harness() -> Harness<MemoryStore> {
    harness_with(MemoryStore::new(), CacheFailureMode::Surface)
}

impl<S> Harness<S> {
    pub fn cached(&self, key: &str) -> bool {
        self.cache.inner.contains(key)
    }
}

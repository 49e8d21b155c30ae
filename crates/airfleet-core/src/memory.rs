//! In-memory store and cache using DashMap (stand-ins for SQLite and Redis)

use crate::document::{document_id, id_value, set_path, Document, Filter, Update, ID_FIELD};
use crate::error::{FleetError, Result};
use crate::ports::{CacheStore, DocumentStore};
use airfleet_types::RecordId;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Document store keeping each collection in an ordered map
///
/// Updates hold the collection's map entry for their whole duration, so each
/// document changes atomically.
#[derive(Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, BTreeMap<RecordId, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn matching_ids(docs: &BTreeMap<RecordId, Document>, filter: &Filter) -> Vec<RecordId> {
    match filter {
        Filter::Id(id) => docs.contains_key(id).then_some(*id).into_iter().collect(),
        _ => docs
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, _)| *id)
            .collect(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(matching_ids(&docs, filter)
            .into_iter()
            .filter_map(|id| docs.get(&id).cloned())
            .collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<RecordId> {
        if !document.is_object() {
            return Err(FleetError::Store(format!(
                "{} document must be an object",
                collection
            )));
        }
        let id = match document_id(&document) {
            Some(id) => id,
            None => {
                let id = RecordId::generate();
                set_path(&mut document, ID_FIELD, id_value(id));
                id
            }
        };
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(FleetError::Store(format!(
                "duplicate id {} in {}",
                id, collection
            )));
        }
        docs.insert(id, document);
        Ok(id)
    }

    async fn update(&self, collection: &str, filter: &Filter, update: &Update) -> Result<u64> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let ids = matching_ids(&docs, filter);
        for id in &ids {
            if let Some(doc) = docs.get_mut(id) {
                update.apply(doc);
            }
        }
        Ok(ids.len() as u64)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let ids = matching_ids(&docs, filter);
        for id in &ids {
            docs.remove(id);
        }
        Ok(ids.len() as u64)
    }
}

/// String cache without expiry
#[derive(Default)]
pub struct MemoryCache {
    data: Arc<DashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if key exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.data.remove(key);
        }
        Ok(())
    }
}

//! Per-kind repositories pairing the document store with cache-aside reads
//!
//! Every mutation goes through [`Repository::update`], [`Repository::insert`]
//! or [`Repository::delete`], which derive the full invalidation set from the
//! record kind. Callers never name cache keys themselves.

use crate::cache_aside::{CacheAside, CacheFailureMode, Lookup};
use crate::deadline::Deadline;
use crate::document::{document_id, id_value, set_path, Document, FieldOp, Filter, Update, ID_FIELD};
use crate::error::{FleetError, Result};
use crate::keys::{
    is_relationship_field, query_fields, relationship_fields, CacheKey, Invalidation,
};
use crate::ports::{CacheStore, DocumentStore};
use airfleet_types::{
    Aircraft, Airline, Engine, EntityKind, Flight, Record, RecordId, Review, Route, User,
};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Repository<T: Record> {
    store: Arc<dyn DocumentStore>,
    cache: CacheAside,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>, cache: CacheAside) -> Self {
        Self {
            store,
            cache,
            _record: PhantomData,
        }
    }

    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn collection(&self) -> &'static str {
        T::KIND.collection()
    }

    /// Load one record, reporting whether the cache served it
    pub async fn lookup(&self, id: RecordId, deadline: &Deadline) -> Result<Lookup<T>> {
        let key = CacheKey::Record(T::KIND, id);
        let loader = move || async move {
            let doc = self
                .store
                .find_one(self.collection(), &Filter::by_id(id))
                .await?
                .ok_or_else(|| FleetError::not_found(T::KIND, id))?;
            decode::<T>(doc)
        };
        deadline
            .run(&format!("read {}", key), self.cache.read_through(&key, loader))
            .await
    }

    pub async fn get(&self, id: RecordId, deadline: &Deadline) -> Result<T> {
        Ok(self.lookup(id, deadline).await?.value)
    }

    /// Like [`Repository::get`] but a missing record is `None`
    pub async fn find(&self, id: RecordId, deadline: &Deadline) -> Result<Option<T>> {
        match self.get(id, deadline).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self, deadline: &Deadline) -> Result<Vec<T>> {
        let key = CacheKey::All(T::KIND);
        self.read_many(key, Filter::All, deadline).await
    }

    /// Records whose `field` holds `value`; only the kind's query fields are cached
    pub async fn list_where(&self, field: &str, value: &str, deadline: &Deadline) -> Result<Vec<T>> {
        if !query_fields(T::KIND).contains(&field) {
            return Err(FleetError::InvalidRequest(format!(
                "{} cannot be listed by {}",
                T::KIND,
                field
            )));
        }
        let key = CacheKey::Query(T::KIND, value.to_string());
        self.read_many(key, Filter::eq(field, value), deadline).await
    }

    async fn read_many(&self, key: CacheKey, filter: Filter, deadline: &Deadline) -> Result<Vec<T>> {
        let filter = &filter;
        let loader = move || async move {
            self.store
                .find(self.collection(), filter)
                .await?
                .into_iter()
                .map(decode::<T>)
                .collect::<Result<Vec<T>>>()
        };
        let lookup = deadline
            .run(&format!("list {}", key), self.cache.read_through(&key, loader))
            .await?;
        Ok(lookup.value)
    }

    /// Store a new record under a fresh identifier
    ///
    /// Relationship fields are reset to empty; they are only ever written by
    /// the synchronization protocols.
    pub async fn insert(&self, record: T, deadline: &Deadline) -> Result<T> {
        let mut doc = serde_json::to_value(&record)?;
        if !doc.is_object() {
            return Err(FleetError::InvalidRequest(format!(
                "{} must be a JSON object",
                T::KIND
            )));
        }
        for (field, arity) in relationship_fields(T::KIND) {
            set_path(&mut doc, field, arity.empty());
        }
        let id = RecordId::generate();
        set_path(&mut doc, ID_FIELD, id_value(id));

        let stage = format!("insert {}", T::KIND);
        let result = deadline
            .run(&stage, self.store.insert(self.collection(), doc.clone()))
            .await;

        let mut set = Invalidation::record(T::KIND, id);
        set.derive_from_document(T::KIND, &doc);
        self.invalidate(&set).await?;

        let id = result?;
        debug!("Inserted {} {}", T::KIND, id);
        decode(doc)
    }

    /// Apply `update` to one record and invalidate everything it can affect
    ///
    /// Returns the matched count. Invalidation runs even when the store call
    /// failed or timed out, since the write may have landed.
    pub async fn update(&self, id: RecordId, update: &Update, deadline: &Deadline) -> Result<u64> {
        // Filtered listings embed whole records, so any write can stale them
        let prior = if query_fields(T::KIND).is_empty() {
            None
        } else {
            self.load_document(id, deadline).await?
        };
        self.write(id, update, prior.as_ref(), deadline).await
    }

    async fn load_document(&self, id: RecordId, deadline: &Deadline) -> Result<Option<Document>> {
        deadline
            .run(
                "load prior document",
                self.store.find_one(self.collection(), &Filter::by_id(id)),
            )
            .await
    }

    async fn write(
        &self,
        id: RecordId,
        update: &Update,
        prior: Option<&Document>,
        deadline: &Deadline,
    ) -> Result<u64> {
        let mut set = Invalidation::record(T::KIND, id);
        set.derive_from_update(T::KIND, update);
        if let Some(prior) = prior {
            set.derive_from_document(T::KIND, prior);
        }

        let stage = format!("update {} {}", T::KIND, id);
        let result = deadline
            .run(&stage, self.store.update(self.collection(), &Filter::by_id(id), update))
            .await;
        self.invalidate(&set).await?;
        let matched = result?;
        debug!("Updated {} {} (matched {})", T::KIND, id, matched);
        Ok(matched)
    }

    /// Like [`Repository::update`] but a missing record is `NotFound`
    pub async fn update_existing(
        &self,
        id: RecordId,
        update: &Update,
        deadline: &Deadline,
    ) -> Result<()> {
        match self.update(id, update, deadline).await? {
            0 => Err(FleetError::not_found(T::KIND, id)),
            _ => Ok(()),
        }
    }

    /// Remove one record; returns the deleted count
    pub async fn delete(&self, id: RecordId, deadline: &Deadline) -> Result<u64> {
        let mut set = Invalidation::record(T::KIND, id);
        let prior = deadline
            .run(
                "load prior document",
                self.store.find_one(self.collection(), &Filter::by_id(id)),
            )
            .await?;
        if let Some(prior) = &prior {
            set.derive_from_document(T::KIND, prior);
        }

        let stage = format!("delete {} {}", T::KIND, id);
        let result = deadline
            .run(&stage, self.store.delete(self.collection(), &Filter::by_id(id)))
            .await;
        self.invalidate(&set).await?;
        let deleted = result?;
        debug!("Deleted {} {} ({})", T::KIND, id, deleted);
        Ok(deleted)
    }

    /// Set-if-present update of scalar fields
    ///
    /// Nested objects are flattened to dotted paths so a partial `general`
    /// block leaves its other fields alone. Relationship fields, `id`, and
    /// values that would leave the record undecodable are rejected before
    /// anything is written.
    pub async fn patch(&self, id: RecordId, fields: Map<String, Value>, deadline: &Deadline) -> Result<T> {
        let mut ops = Vec::new();
        flatten_fields(String::new(), fields, &mut ops);

        for (path, _) in &ops {
            if path == ID_FIELD || is_relationship_field(T::KIND, path) {
                return Err(FleetError::InvalidRequest(format!(
                    "{} field {} cannot be patched",
                    T::KIND,
                    path
                )));
            }
        }

        let update = ops
            .into_iter()
            .fold(Update::new(), |update, (path, value)| {
                update.op(path, FieldOp::SetIfPresent(value))
            });
        if update.is_empty() {
            return self.get(id, deadline).await;
        }

        let current = self
            .load_document(id, deadline)
            .await?
            .ok_or_else(|| FleetError::not_found(T::KIND, id))?;
        let mut patched = current.clone();
        update.apply(&mut patched);
        if let Err(e) = serde_json::from_value::<T>(patched) {
            return Err(FleetError::InvalidRequest(format!(
                "{} {} patch rejected: {}",
                T::KIND,
                id,
                e
            )));
        }

        match self.write(id, &update, Some(&current), deadline).await? {
            0 => Err(FleetError::not_found(T::KIND, id)),
            _ => self.get(id, deadline).await,
        }
    }

    /// Drop the given keys from the cache
    pub async fn invalidate(&self, set: &Invalidation) -> Result<()> {
        if let Err(e) = self.cache.invalidate(set).await {
            warn!("Invalidation of {:?} failed: {}", set.rendered(), e);
            return Err(e);
        }
        Ok(())
    }
}

fn decode<T: Record>(doc: Document) -> Result<T> {
    let id = document_id(&doc);
    serde_json::from_value(doc).map_err(|e| {
        FleetError::Serialization(format!("{} {:?}: {}", T::KIND, id, e))
    })
}

fn flatten_fields(prefix: String, fields: Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (name, value) in fields {
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            Value::Object(nested) => flatten_fields(path, nested, out),
            other => out.push((path, other)),
        }
    }
}

/// One repository per record kind, shared across requests
#[derive(Clone)]
pub struct Repositories {
    pub aircraft: Arc<Repository<Aircraft>>,
    pub engines: Arc<Repository<Engine>>,
    pub airlines: Arc<Repository<Airline>>,
    pub users: Arc<Repository<User>>,
    pub flights: Arc<Repository<Flight>>,
    pub routes: Arc<Repository<Route>>,
    pub reviews: Arc<Repository<Review>>,
}

impl Repositories {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn CacheStore>,
        failure_mode: CacheFailureMode,
    ) -> Self {
        let cache = CacheAside::new(cache, failure_mode);
        Self {
            aircraft: Arc::new(Repository::new(store.clone(), cache.clone())),
            engines: Arc::new(Repository::new(store.clone(), cache.clone())),
            airlines: Arc::new(Repository::new(store.clone(), cache.clone())),
            users: Arc::new(Repository::new(store.clone(), cache.clone())),
            flights: Arc::new(Repository::new(store.clone(), cache.clone())),
            routes: Arc::new(Repository::new(store.clone(), cache.clone())),
            reviews: Arc::new(Repository::new(store, cache)),
        }
    }
}

//! Cache keys and the invalidation sets derived from them
//!
//! Each kind caches under three shapes: `<collection>` for the full listing,
//! `<collection>/<id>` for a single record, and `<collection>/<value>` for a
//! listing filtered on one of the kind's query fields. Writes never list keys
//! by hand; they build an [`Invalidation`] from the record and the update.

use crate::document::{strings_at, Document, Update};
use airfleet_types::{EntityKind, RecordId};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    All(EntityKind),
    Record(EntityKind, RecordId),
    Query(EntityKind, String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::All(kind) => write!(f, "{}", kind.collection()),
            CacheKey::Record(kind, id) => write!(f, "{}/{}", kind.collection(), id),
            CacheKey::Query(kind, value) => write!(f, "{}/{}", kind.collection(), value),
        }
    }
}

/// Fields whose values name a cached filtered listing
pub fn query_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Aircraft => &["general.name"],
        EntityKind::User => &["airlines"],
        _ => &[],
    }
}

/// How a relationship field holds its references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    Many,
}

impl Arity {
    /// Value a freshly created record carries in the field
    pub fn empty(&self) -> Value {
        match self {
            Arity::One => Value::Null,
            Arity::Many => Value::Array(Vec::new()),
        }
    }
}

/// Fields written only by relationship protocols
pub fn relationship_fields(kind: EntityKind) -> &'static [(&'static str, Arity)] {
    match kind {
        EntityKind::Aircraft => &[
            ("engines", Arity::Many),
            ("history", Arity::Many),
            ("owner", Arity::One),
            ("tags", Arity::Many),
        ],
        EntityKind::Engine => &[("owningAircraft", Arity::One)],
        EntityKind::Airline => &[
            ("fleet", Arity::Many),
            ("reviews", Arity::Many),
            ("routes", Arity::Many),
            ("owner", Arity::One),
        ],
        EntityKind::User => &[("airlines", Arity::Many)],
        EntityKind::Flight | EntityKind::Route | EntityKind::Review => &[],
    }
}

pub fn is_relationship_field(kind: EntityKind, path: &str) -> bool {
    relationship_fields(kind)
        .iter()
        .any(|(field, _)| path == *field || path.starts_with(&format!("{field}.")))
}

/// De-duplicated set of keys to drop after a write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invalidation {
    keys: Vec<CacheKey>,
}

impl Invalidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record key plus its kind's full listing
    pub fn record(kind: EntityKind, id: RecordId) -> Self {
        let mut set = Self::new();
        set.add(CacheKey::Record(kind, id));
        set.add(CacheKey::All(kind));
        set
    }

    pub fn add(&mut self, key: CacheKey) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn extend(&mut self, other: Invalidation) {
        for key in other.keys {
            self.add(key);
        }
    }

    /// Filtered listings that currently include the document
    pub fn derive_from_document(&mut self, kind: EntityKind, doc: &Document) {
        for field in query_fields(kind) {
            for value in strings_at(doc, field) {
                self.add(CacheKey::Query(kind, value));
            }
        }
    }

    /// Filtered listings the update can add the document to or drop it from
    pub fn derive_from_update(&mut self, kind: EntityKind, update: &Update) {
        for (path, op) in update.ops() {
            if !query_fields(kind).contains(&path.as_str()) {
                continue;
            }
            for value in op.written_values() {
                if let Some(s) = value.as_str() {
                    if !s.is_empty() {
                        self.add(CacheKey::Query(kind, s.to_string()));
                    }
                }
            }
        }
    }

    pub fn keys(&self) -> &[CacheKey] {
        &self.keys
    }

    pub fn rendered(&self) -> Vec<String> {
        self.keys.iter().map(ToString::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

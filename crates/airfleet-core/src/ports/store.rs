//! Document store port

use crate::document::{Document, Filter, Update};
use crate::Result;
use airfleet_types::RecordId;
use async_trait::async_trait;

/// Backing store holding one collection per entity kind
///
/// Backends must apply an [`Update`] to each matched document atomically.
/// Nothing spans documents: two updates issued back to back may be observed
/// half applied by a concurrent reader.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Insert a document, assigning an `id` when it has none
    async fn insert(&self, collection: &str, document: Document) -> Result<RecordId>;

    /// Returns the number of matched documents
    async fn update(&self, collection: &str, filter: &Filter, update: &Update) -> Result<u64>;

    /// Returns the number of deleted documents
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64>;
}

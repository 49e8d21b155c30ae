//! Airfleet Core Library
//!
//! Relationship synchronization and cache-aside access for the Airfleet
//! record service. Storage and caching are reached only through the traits in
//! [`ports`]; concrete backends live in [`memory`] and in the server crate.

pub use airfleet_types::*;

pub mod cache_aside;
pub mod deadline;
pub mod document;
pub mod error;
pub mod keys;
pub mod memory;
pub mod navigate;
pub mod ports;
pub mod repository;
pub mod sync;
pub mod toggle;

pub use cache_aside::{CacheAside, CacheFailureMode, Lookup};
pub use deadline::Deadline;
pub use document::{Document, FieldOp, Filter, Update};
pub use error::{parse_ids, FleetError, Result};
pub use keys::{CacheKey, Invalidation};
pub use memory::{MemoryCache, MemoryStore};
pub use navigate::Navigator;
pub use ports::{CacheStore, DocumentStore};
pub use repository::{Repositories, Repository};
pub use sync::{BestEffortSync, RelationshipSync, SyncReport};
pub use toggle::toggle;

//! Port traits (interfaces) for the store and cache collaborators

pub mod cache;
pub mod store;

pub use cache::CacheStore;
pub use store::DocumentStore;

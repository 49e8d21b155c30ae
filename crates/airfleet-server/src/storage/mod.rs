//! Storage and cache backends

pub mod redis;
pub mod sqlite;

pub use self::redis::RedisCache;
pub use self::sqlite::SqliteStore;

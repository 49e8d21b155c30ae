//! Airfleet Types - Pure record definitions
//!
//! Entity documents, identifiers and entity kinds shared by the engine and
//! the server. No runtime or storage dependencies live here.

pub mod aircraft;
pub mod airline;
pub mod flight;
pub mod user;

pub use aircraft::*;
pub use airline::*;
pub use flight::*;
pub use user::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Raised when text cannot be read as a record identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed record id: {0:?}")]
pub struct InvalidRecordId(pub String);

/// Identifier of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocate a fresh, time-ordered identifier
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse every element, failing on the first malformed one
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>, InvalidRecordId> {
        raw.iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| InvalidRecordId(s.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The kinds of record the service stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Aircraft,
    Engine,
    Airline,
    User,
    Flight,
    Route,
    Review,
}

impl EntityKind {
    /// Collection name; also the cache namespace for the kind
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Aircraft => "aircraft",
            EntityKind::Engine => "engines",
            EntityKind::Airline => "airlines",
            EntityKind::User => "users",
            EntityKind::Flight => "flights",
            EntityKind::Route => "routes",
            EntityKind::Review => "reviews",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Aircraft => write!(f, "aircraft"),
            EntityKind::Engine => write!(f, "engine"),
            EntityKind::Airline => write!(f, "airline"),
            EntityKind::User => write!(f, "user"),
            EntityKind::Flight => write!(f, "flight"),
            EntityKind::Route => write!(f, "route"),
            EntityKind::Review => write!(f, "review"),
        }
    }
}

/// A document type with a fixed kind and an optional identifier
///
/// The identifier is absent only on records that have not been inserted yet.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> Option<RecordId>;
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl $crate::Record for $ty {
            const KIND: $crate::EntityKind = $kind;

            fn id(&self) -> Option<$crate::RecordId> {
                self.id
            }
        }
    };
}

pub(crate) use impl_record;

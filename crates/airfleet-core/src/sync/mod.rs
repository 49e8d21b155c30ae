//! Relationship synchronization across documents
//!
//! A relationship is stored on both sides (or denormalized onto one side), and
//! no protocol here runs inside a multi-document transaction. Each protocol is
//! an ordered list of single-document writes; every write invalidates its own
//! cache keys before the next one starts, so a failure midway leaves the cache
//! coherent with whatever did commit.

mod best_effort;
pub mod links;

pub use best_effort::BestEffortSync;

use crate::deadline::Deadline;
use crate::error::{FleetError, Result};
use airfleet_types::RecordId;
use async_trait::async_trait;
use serde::Serialize;

/// Writes committed by one protocol run, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub committed: Vec<String>,
}

impl SyncReport {
    pub fn record(&mut self, step: impl Into<String>) {
        self.committed.push(step.into());
    }

    /// Attach the committed steps to a failure
    ///
    /// A failure before any write stays as it is. A failure that already
    /// carries committed steps from a nested protocol is merged.
    pub fn wrap(&mut self, err: FleetError) -> FleetError {
        let err = match err {
            FleetError::PartialApplication { committed, source } => {
                self.committed.extend(committed);
                *source
            }
            other => other,
        };
        if self.committed.is_empty() {
            return err;
        }
        FleetError::PartialApplication {
            committed: std::mem::take(&mut self.committed),
            source: Box::new(err),
        }
    }

    pub(crate) fn finish(mut self, result: Result<()>) -> Result<SyncReport> {
        match result {
            Ok(()) => Ok(self),
            Err(e) => Err(self.wrap(e)),
        }
    }
}

/// Multi-document relationship protocols
///
/// Every identifier is already parsed; malformed input never reaches this
/// trait. A transactional store can provide its own implementation.
#[async_trait]
pub trait RelationshipSync: Send + Sync {
    /// Toggle aircraft into or out of an airline's fleet, mirroring each
    /// aircraft's operating history
    async fn update_fleet(
        &self,
        airline: RecordId,
        aircraft: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    /// Install engines on an aircraft, detaching them from any former one
    async fn update_engines(
        &self,
        aircraft: RecordId,
        engines: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    /// Transfer airlines to a user, detaching them from any former owner
    async fn update_user_airlines(
        &self,
        user: RecordId,
        airlines: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    /// Same link as [`RelationshipSync::update_user_airlines`], driven from the airline
    async fn update_airline_owner(
        &self,
        airline: RecordId,
        user: RecordId,
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    /// Detach an airline from its owner and fleet, then delete it
    async fn delete_airline(&self, airline: RecordId, deadline: &Deadline) -> Result<SyncReport>;

    /// Delete every airline the user owns, then the user
    async fn delete_user(&self, user: RecordId, deadline: &Deadline) -> Result<SyncReport>;

    async fn delete_engine(&self, engine: RecordId, deadline: &Deadline) -> Result<SyncReport>;

    async fn delete_aircraft(&self, aircraft: RecordId, deadline: &Deadline) -> Result<SyncReport>;

    async fn update_reviews(
        &self,
        airline: RecordId,
        reviews: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    async fn update_routes(
        &self,
        airline: RecordId,
        routes: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    async fn update_tags(
        &self,
        aircraft: RecordId,
        tags: &[String],
        deadline: &Deadline,
    ) -> Result<SyncReport>;

    /// Set or clear the owning user; users keep no inverse list
    async fn update_aircraft_owner(
        &self,
        aircraft: RecordId,
        owner: Option<RecordId>,
        deadline: &Deadline,
    ) -> Result<SyncReport>;
}

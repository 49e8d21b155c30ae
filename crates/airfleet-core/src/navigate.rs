//! Read-only traversal of relationship fields

use crate::deadline::Deadline;
use crate::error::Result;
use crate::repository::{Repositories, Repository};
use airfleet_types::{Aircraft, Airline, Engine, Record, RecordId, User};
use futures::future::try_join_all;
use tracing::warn;

/// Resolves the records a relationship field points at
///
/// References to records that no longer exist are skipped.
#[derive(Clone)]
pub struct Navigator {
    repos: Repositories,
}

impl Navigator {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn aircraft_engines(&self, aircraft: RecordId, deadline: &Deadline) -> Result<Vec<Engine>> {
        let aircraft = self.repos.aircraft.get(aircraft, deadline).await?;
        resolve_all(&self.repos.engines, &aircraft.engines, deadline).await
    }

    /// The airline at the end of the aircraft's history
    pub async fn aircraft_operator(&self, aircraft: RecordId, deadline: &Deadline) -> Result<Option<Airline>> {
        let aircraft = self.repos.aircraft.get(aircraft, deadline).await?;
        resolve_one(&self.repos.airlines, aircraft.current_operator(), deadline).await
    }

    pub async fn aircraft_owner(&self, aircraft: RecordId, deadline: &Deadline) -> Result<Option<User>> {
        let aircraft = self.repos.aircraft.get(aircraft, deadline).await?;
        resolve_one(&self.repos.users, aircraft.owner, deadline).await
    }

    pub async fn airline_fleet(&self, airline: RecordId, deadline: &Deadline) -> Result<Vec<Aircraft>> {
        let airline = self.repos.airlines.get(airline, deadline).await?;
        resolve_all(&self.repos.aircraft, &airline.fleet, deadline).await
    }

    pub async fn airline_owner(&self, airline: RecordId, deadline: &Deadline) -> Result<Option<User>> {
        let airline = self.repos.airlines.get(airline, deadline).await?;
        resolve_one(&self.repos.users, airline.owner, deadline).await
    }

    pub async fn user_airlines(&self, user: RecordId, deadline: &Deadline) -> Result<Vec<Airline>> {
        let user = self.repos.users.get(user, deadline).await?;
        resolve_all(&self.repos.airlines, &user.airlines, deadline).await
    }
}

async fn resolve_one<T: Record>(
    repo: &Repository<T>,
    id: Option<RecordId>,
    deadline: &Deadline,
) -> Result<Option<T>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let found = repo.find(id, deadline).await?;
    if found.is_none() {
        warn!("Dangling {} reference {}", T::KIND, id);
    }
    Ok(found)
}

async fn resolve_all<T: Record>(
    repo: &Repository<T>,
    ids: &[RecordId],
    deadline: &Deadline,
) -> Result<Vec<T>> {
    let found = try_join_all(ids.iter().map(|&id| repo.find(id, deadline))).await?;
    let total = found.len();
    let resolved: Vec<T> = found.into_iter().flatten().collect();
    if resolved.len() < total {
        warn!("Skipped {} dangling {} reference(s)", total - resolved.len(), T::KIND);
    }
    Ok(resolved)
}

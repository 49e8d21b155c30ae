use super::links::{OwnerLink, AIRLINE_OWNERSHIP, ENGINE_INSTALLATION, FLEET_FIELD, HISTORY_FIELD};
use super::{RelationshipSync, SyncReport};
use crate::deadline::Deadline;
use crate::document::{id_value, Update};
use crate::error::{FleetError, Result};
use crate::repository::{Repositories, Repository};
use crate::toggle::{self, Direction};
use airfleet_types::{EntityKind, Record, RecordId};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Runs each protocol as ordered single-document writes with no rollback
#[derive(Clone)]
pub struct BestEffortSync {
    repos: Repositories,
}

impl BestEffortSync {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Move each child under `target`, detaching it from its former parent
    ///
    /// The target is checked before any write. A child that already belongs
    /// to the target is toggled out of it instead.
    #[allow(clippy::too_many_arguments)]
    async fn transfer<C: Record, P: Record>(
        &self,
        link: &OwnerLink<C, P>,
        children: &Repository<C>,
        parents: &Repository<P>,
        target: RecordId,
        child_ids: &[RecordId],
        deadline: &Deadline,
        report: &mut SyncReport,
    ) -> Result<()> {
        parents.get(target, deadline).await?;

        for &child_id in child_ids {
            let child = children.get(child_id, deadline).await?;

            if let Some(former) = (link.back_ref)(&child).filter(|former| *former != target) {
                if parents.find(former, deadline).await?.is_some() {
                    let detach = Update::new().remove_ids(link.parent_field, &[child_id]);
                    parents.update(former, &detach, deadline).await?;
                    debug!("Detached {} {} from {} {}", C::KIND, child_id, P::KIND, former);
                    report.record(format!(
                        "removed {} {} from {} {} {}",
                        C::KIND,
                        child_id,
                        P::KIND,
                        former,
                        link.parent_field
                    ));
                } else {
                    warn!(
                        "{} {} references missing {} {}, skipping detach",
                        C::KIND,
                        child_id,
                        P::KIND,
                        former
                    );
                }
            }

            let attach = Update::new().toggle_ids(link.parent_field, &[child_id]);
            parents.update_existing(target, &attach, deadline).await?;
            report.record(format!(
                "toggled {} {} in {} {} {}",
                C::KIND,
                child_id,
                P::KIND,
                target,
                link.parent_field
            ));

            let back_ref = Update::new().flip(link.child_field, target);
            children.update_existing(child_id, &back_ref, deadline).await?;
            debug!("Flipped {} {} {}", C::KIND, child_id, link.child_field);
            report.record(format!(
                "flipped {} {} {}",
                C::KIND,
                child_id,
                link.child_field
            ));
        }
        Ok(())
    }

    /// Toggle aircraft into or out of the fleet and mirror it on each history
    ///
    /// The direction is decided once, from the first candidate against the
    /// current fleet, and both sides move that way for every aircraft.
    async fn fleet_steps(
        &self,
        airline: RecordId,
        aircraft: &[RecordId],
        deadline: &Deadline,
        report: &mut SyncReport,
    ) -> Result<()> {
        let current = self.repos.airlines.get(airline, deadline).await?;
        for &id in aircraft {
            self.repos.aircraft.get(id, deadline).await?;
        }
        let Some(direction) = toggle::direction(&current.fleet, aircraft) else {
            return Ok(());
        };

        let (fleet, history) = match direction {
            Direction::Add => (
                Update::new().add_ids(FLEET_FIELD, aircraft),
                Update::new().add_ids(HISTORY_FIELD, &[airline]),
            ),
            Direction::Remove => (
                Update::new().remove_ids(FLEET_FIELD, aircraft),
                Update::new().remove_ids(HISTORY_FIELD, &[airline]),
            ),
        };
        self.repos.airlines.update_existing(airline, &fleet, deadline).await?;
        report.record(format!("{:?} airline {} fleet", direction, airline));

        for &id in aircraft {
            self.repos.aircraft.update_existing(id, &history, deadline).await?;
            report.record(format!("{:?} aircraft {} history", direction, id));
        }
        Ok(())
    }

    async fn delete_airline_steps(
        &self,
        airline_id: RecordId,
        deadline: &Deadline,
        report: &mut SyncReport,
    ) -> Result<()> {
        let airline = self.repos.airlines.get(airline_id, deadline).await?;

        if let Some(owner) = airline.owner {
            if self.repos.users.find(owner, deadline).await?.is_some() {
                let detach = Update::new().remove_ids(AIRLINE_OWNERSHIP.parent_field, &[airline_id]);
                self.repos.users.update(owner, &detach, deadline).await?;
                report.record(format!("removed airline {} from user {}", airline_id, owner));
            } else {
                warn!("Airline {} owner {} is missing", airline_id, owner);
            }
        }

        for &aircraft_id in &airline.fleet {
            let Some(aircraft) = self.repos.aircraft.find(aircraft_id, deadline).await? else {
                warn!("Airline {} fleet lists missing aircraft {}", airline_id, aircraft_id);
                continue;
            };
            if aircraft.history.is_empty() {
                continue;
            }
            let detach = Update::new().remove_ids(HISTORY_FIELD, &[airline_id]);
            self.repos.aircraft.update(aircraft_id, &detach, deadline).await?;
            report.record(format!(
                "removed airline {} from aircraft {} history",
                airline_id, aircraft_id
            ));
        }

        match self.repos.airlines.delete(airline_id, deadline).await? {
            0 => Err(FleetError::not_found(EntityKind::Airline, airline_id)),
            _ => {
                report.record(format!("deleted airline {}", airline_id));
                Ok(())
            }
        }
    }

    async fn delete_user_steps(
        &self,
        user_id: RecordId,
        deadline: &Deadline,
        report: &mut SyncReport,
    ) -> Result<()> {
        let user = self.repos.users.get(user_id, deadline).await?;

        for &airline_id in &user.airlines {
            if self.repos.airlines.find(airline_id, deadline).await?.is_none() {
                warn!("User {} lists missing airline {}", user_id, airline_id);
                continue;
            }
            self.delete_airline_steps(airline_id, deadline, report).await?;
        }

        match self.repos.users.delete(user_id, deadline).await? {
            0 => Err(FleetError::not_found(EntityKind::User, user_id)),
            _ => {
                report.record(format!("deleted user {}", user_id));
                Ok(())
            }
        }
    }

    /// Delete a record that nothing detaches from
    async fn delete_plain<T: Record>(
        &self,
        repo: &Repository<T>,
        id: RecordId,
        report: &mut SyncReport,
        deadline: &Deadline,
    ) -> Result<()> {
        match repo.delete(id, deadline).await? {
            0 => Err(FleetError::not_found(T::KIND, id)),
            _ => {
                report.record(format!("deleted {} {}", T::KIND, id));
                Ok(())
            }
        }
    }

    /// A single toggle on a relationship array with no inverse side
    async fn toggle_one_sided<T: Record>(
        &self,
        repo: &Repository<T>,
        id: RecordId,
        field: &str,
        values: Vec<Value>,
        deadline: &Deadline,
        report: &mut SyncReport,
    ) -> Result<()> {
        let update = Update::new().toggle_values(field, values);
        repo.update_existing(id, &update, deadline).await?;
        report.record(format!("toggled {} {} {}", T::KIND, id, field));
        Ok(())
    }
}

#[async_trait]
impl RelationshipSync for BestEffortSync {
    async fn update_fleet(
        &self,
        airline: RecordId,
        aircraft: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Updating fleet of airline {} ({} aircraft)", airline, aircraft.len());
        let mut report = SyncReport::default();
        let result = self.fleet_steps(airline, aircraft, deadline, &mut report).await;
        report.finish(result)
    }

    async fn update_engines(
        &self,
        aircraft: RecordId,
        engines: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Updating engines of aircraft {} ({} engines)", aircraft, engines.len());
        let mut report = SyncReport::default();
        let result = self
            .transfer(
                &ENGINE_INSTALLATION,
                &self.repos.engines,
                &self.repos.aircraft,
                aircraft,
                engines,
                deadline,
                &mut report,
            )
            .await;
        report.finish(result)
    }

    async fn update_user_airlines(
        &self,
        user: RecordId,
        airlines: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Updating airlines of user {} ({} airlines)", user, airlines.len());
        let mut report = SyncReport::default();
        let result = self
            .transfer(
                &AIRLINE_OWNERSHIP,
                &self.repos.airlines,
                &self.repos.users,
                user,
                airlines,
                deadline,
                &mut report,
            )
            .await;
        report.finish(result)
    }

    async fn update_airline_owner(
        &self,
        airline: RecordId,
        user: RecordId,
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Transferring airline {} to user {}", airline, user);
        let mut report = SyncReport::default();
        let result = self
            .transfer(
                &AIRLINE_OWNERSHIP,
                &self.repos.airlines,
                &self.repos.users,
                user,
                &[airline],
                deadline,
                &mut report,
            )
            .await;
        report.finish(result)
    }

    async fn delete_airline(&self, airline: RecordId, deadline: &Deadline) -> Result<SyncReport> {
        info!("Deleting airline {}", airline);
        let mut report = SyncReport::default();
        let result = self.delete_airline_steps(airline, deadline, &mut report).await;
        report.finish(result)
    }

    async fn delete_user(&self, user: RecordId, deadline: &Deadline) -> Result<SyncReport> {
        info!("Deleting user {} and owned airlines", user);
        let mut report = SyncReport::default();
        let result = self.delete_user_steps(user, deadline, &mut report).await;
        report.finish(result)
    }

    async fn delete_engine(&self, engine: RecordId, deadline: &Deadline) -> Result<SyncReport> {
        info!("Deleting engine {}", engine);
        let mut report = SyncReport::default();
        let result = self
            .delete_plain(&self.repos.engines, engine, &mut report, deadline)
            .await;
        report.finish(result)
    }

    async fn delete_aircraft(&self, aircraft: RecordId, deadline: &Deadline) -> Result<SyncReport> {
        info!("Deleting aircraft {}", aircraft);
        let mut report = SyncReport::default();
        let result = self
            .delete_plain(&self.repos.aircraft, aircraft, &mut report, deadline)
            .await;
        report.finish(result)
    }

    async fn update_reviews(
        &self,
        airline: RecordId,
        reviews: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Updating reviews of airline {}", airline);
        let mut report = SyncReport::default();
        let values = reviews.iter().copied().map(id_value).collect();
        let result = self
            .toggle_one_sided(&self.repos.airlines, airline, "reviews", values, deadline, &mut report)
            .await;
        report.finish(result)
    }

    async fn update_routes(
        &self,
        airline: RecordId,
        routes: &[RecordId],
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Updating routes of airline {}", airline);
        let mut report = SyncReport::default();
        let values = routes.iter().copied().map(id_value).collect();
        let result = self
            .toggle_one_sided(&self.repos.airlines, airline, "routes", values, deadline, &mut report)
            .await;
        report.finish(result)
    }

    async fn update_tags(
        &self,
        aircraft: RecordId,
        tags: &[String],
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Updating tags of aircraft {}", aircraft);
        let mut report = SyncReport::default();
        let values = tags.iter().cloned().map(Value::String).collect();
        let result = self
            .toggle_one_sided(&self.repos.aircraft, aircraft, "tags", values, deadline, &mut report)
            .await;
        report.finish(result)
    }

    async fn update_aircraft_owner(
        &self,
        aircraft: RecordId,
        owner: Option<RecordId>,
        deadline: &Deadline,
    ) -> Result<SyncReport> {
        info!("Setting owner of aircraft {} to {:?}", aircraft, owner);
        let mut report = SyncReport::default();
        let result = async {
            if let Some(user) = owner {
                self.repos.users.get(user, deadline).await?;
            }
            let value = owner.map(id_value).unwrap_or(Value::Null);
            let update = Update::new().set("owner", value);
            self.repos.aircraft.update_existing(aircraft, &update, deadline).await?;
            report.record(format!("set aircraft {} owner", aircraft));
            Ok::<(), FleetError>(())
        }
        .await;
        report.finish(result)
    }
}

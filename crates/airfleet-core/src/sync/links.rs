//! Single-owner links between record kinds

use airfleet_types::{Aircraft, Airline, Engine, RecordId, User};
use std::marker::PhantomData;

/// A child holding one back-reference to a parent that lists it
///
/// `C` is the child kind, `P` the parent kind.
pub struct OwnerLink<C, P> {
    /// Back-reference field on the child
    pub child_field: &'static str,
    /// Array field on the parent
    pub parent_field: &'static str,
    pub back_ref: fn(&C) -> Option<RecordId>,
    parent: PhantomData<fn() -> P>,
}

impl<C, P> OwnerLink<C, P> {
    pub const fn new(
        child_field: &'static str,
        parent_field: &'static str,
        back_ref: fn(&C) -> Option<RecordId>,
    ) -> Self {
        Self {
            child_field,
            parent_field,
            back_ref,
            parent: PhantomData,
        }
    }
}

fn engine_aircraft(engine: &Engine) -> Option<RecordId> {
    engine.owning_aircraft
}

fn airline_owner(airline: &Airline) -> Option<RecordId> {
    airline.owner
}

/// Engine.owningAircraft and Aircraft.engines
pub const ENGINE_INSTALLATION: OwnerLink<Engine, Aircraft> =
    OwnerLink::new("owningAircraft", "engines", engine_aircraft);

/// Airline.owner and User.airlines
pub const AIRLINE_OWNERSHIP: OwnerLink<Airline, User> =
    OwnerLink::new("owner", "airlines", airline_owner);

/// Airline.fleet and Aircraft.history, both arrays
pub const FLEET_FIELD: &str = "fleet";
pub const HISTORY_FIELD: &str = "history";

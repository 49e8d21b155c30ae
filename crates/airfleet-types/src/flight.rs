//! Flight records

use crate::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A scheduled flight
///
/// Departure and arrival references are plain pointers; the engine does not
/// keep an inverse list for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_time: Option<String>,
    #[serde(default)]
    pub departure_time: BTreeMap<String, String>,
    #[serde(default)]
    pub arrival_time: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft: Option<RecordId>,
}

crate::impl_record!(Flight, EntityKind::Flight);

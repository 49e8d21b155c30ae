//! Aircraft and engine records

use crate::{EntityKind, RecordId};
use serde::{Deserialize, Serialize};

/// An aircraft listed on the marketplace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aircraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub general: AircraftGeneral,
    /// Installed engines; each engine points back through `owning_aircraft`
    #[serde(default)]
    pub engines: Vec<RecordId>,
    /// Operating airlines, oldest first; the last entry is the current operator
    #[serde(default)]
    pub history: Vec<RecordId>,
    #[serde(default)]
    pub owner: Option<RecordId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Aircraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            general: AircraftGeneral {
                name: Some(name.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// The airline operating the aircraft right now
    pub fn current_operator(&self) -> Option<RecordId> {
        self.history.last().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftGeneral {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_operating: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// A powerplant that can be installed on at most one aircraft
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub owning_aircraft: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<u32>,
    /// Time between overhauls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tbo: Option<u32>,
    /// Hot section time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hst: Option<u32>,
}

impl Engine {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }
}

crate::impl_record!(Aircraft, EntityKind::Aircraft);
crate::impl_record!(Engine, EntityKind::Engine);

// ── Canonical inventory entities ──
//
// Normalized output of collection, and the unit of write-transaction
// content. These are detached from the wire types in `muster-api`:
// tags are stripped, machines are de-duplicated, IPs are selected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A cloud known to a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloud {
    pub name: String,
}

/// Identity of the controller for one run, built once at run start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerInfo {
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub clouds: Vec<Cloud>,
}

/// A machine, keyed by `instance_id` within its model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Remote-assigned numeric machine id.
    pub ordinal: i64,
    /// Selected IP, absent when no address satisfied the heuristic.
    pub ip: Option<String>,
    pub instance_id: String,
}

/// A unit of an application, hosted on exactly one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Numeric suffix of the unit name.
    pub ordinal: i64,
    pub name: String,
    /// Reference into the model's machine map; resolved to a store-assigned
    /// machine id only at write time.
    pub machine_instance_id: String,
}

/// An application and its units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub charm: String,
    pub subordinate: bool,
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// One model: the unit of collection and of write-transaction content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub uuid: String,
    pub name: String,
    pub owner: String,
    pub controller_uuid: String,
    pub cloud: String,
    #[serde(default)]
    pub applications: Vec<Application>,
    /// Machines keyed by instance id. Every machine referenced by a unit
    /// exists here before the model is written.
    #[serde(default)]
    pub machines: IndexMap<String, Machine>,
}

// ── Wire types for the controller API ──
//
// These mirror the JSON the controller returns for model detail queries.
// They are transport-shaped, not canonical: `muster-core` normalizes them
// into its own entity graph (tag stripping, machine de-duplication, IP
// selection) before anything is persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A cloud as reported by the controller's cloud listing.
///
/// Keys in the listing are cloud tags (`cloud-{name}`); the payload itself
/// carries little the collector needs beyond existence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudDetail {
    /// Provider kind (e.g. "lxd", "manual"), when the controller reports it.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Full detail for one model: metadata plus its application graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDetail {
    pub info: ModelInfo,
    /// Applications keyed by application name.
    #[serde(default)]
    pub applications: BTreeMap<String, ApplicationDetail>,
}

/// Model metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    /// Owner tag (`user-{name}`).
    pub owner_tag: String,
    /// Cloud tag (`cloud-{name}`).
    pub cloud_tag: String,
    /// Provider classification of the model's infrastructure.
    pub provider_type: String,
}

/// One application and its units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetail {
    pub charm_name: String,
    #[serde(default)]
    pub subordinate: bool,
    #[serde(default)]
    pub units: Vec<UnitDetail>,
}

/// One unit, including the machine hosting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDetail {
    /// Unit name (`{application}/{ordinal}`).
    pub name: String,
    pub machine: MachineDetail,
    /// Separately-reported public address, used as the last IP fallback.
    #[serde(default)]
    pub public_address: Option<String>,
}

/// One machine as reported per-unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineDetail {
    /// Remote-assigned numeric machine id, as a string.
    pub id: String,
    pub instance_id: String,
    /// Address basket. Absent (as opposed to empty) when the controller
    /// could not report addresses at all.
    #[serde(default)]
    pub addresses: Option<Vec<Address>>,
}

/// One entry from a machine's address basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Address scope (e.g. "local-cloud", "public", "local-machine").
    pub scope: String,
    /// Address family (e.g. "ipv4", "ipv6").
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

// ── Response envelopes ──────────────────────────────────────────────

/// Response to the login call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub controller_name: String,
    pub controller_uuid: String,
}

/// Response to the cloud listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudsResponse {
    /// Clouds keyed by cloud tag (`cloud-{name}`).
    #[serde(default)]
    pub clouds: BTreeMap<String, CloudDetail>,
}

/// Response to the model listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUuidsResponse {
    /// Model UUIDs keyed by qualified model name.
    #[serde(default)]
    pub models: BTreeMap<String, String>,
}

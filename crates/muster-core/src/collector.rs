// ── Model collection ──
//
// Walks one model's detail through the controller capability and
// assembles the canonical entity tree. Owns the two non-obvious pieces
// of the pipeline: machine de-duplication by instance id, and the
// IP-selection heuristic over the machine's address basket.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use muster_api::{ClusterClient, MachineDetail, UnitDetail};

use crate::entity::{Application, Machine, Model, Unit};
use crate::error::CollectError;

/// Provider types collected into the store. Anything else is skipped.
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["lxd", "manual"];

/// Rules for picking a machine's IP out of its address basket.
///
/// Controllers report a lot of faulty addresses: ipv6, docker bridges,
/// machine-local scopes. Selection order:
///
/// 1. keep addresses whose scope and type are permitted;
/// 2. among those, the first address under `preferred_prefix` wins;
/// 3. otherwise the first address not under `banned_prefix`;
/// 4. otherwise the separately-reported public address;
/// 5. otherwise the machine has no IP — which is not an error.
///
/// Selection is order-stable: ties break by original address list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSelectionRules {
    #[serde(default = "default_scopes")]
    pub permitted_scopes: Vec<String>,
    #[serde(default = "default_types")]
    pub permitted_types: Vec<String>,
    #[serde(default = "default_preferred")]
    pub preferred_prefix: String,
    #[serde(default = "default_banned")]
    pub banned_prefix: String,
}

fn default_scopes() -> Vec<String> {
    vec!["local-cloud".into()]
}
fn default_types() -> Vec<String> {
    vec!["ipv4".into()]
}
fn default_preferred() -> String {
    "192.168".into()
}
fn default_banned() -> String {
    "172.17".into()
}

impl Default for IpSelectionRules {
    fn default() -> Self {
        Self {
            permitted_scopes: default_scopes(),
            permitted_types: default_types(),
            preferred_prefix: default_preferred(),
            banned_prefix: default_banned(),
        }
    }
}

/// Apply [`IpSelectionRules`] to one machine's address basket.
///
/// A machine with no reported address basket at all is logged and gets no
/// IP — that path never consults the public address, matching the
/// behavior of treating the lookup failure itself as "no IP".
fn select_machine_ip(
    rules: &IpSelectionRules,
    model_uuid: &str,
    machine: &MachineDetail,
    public_address: Option<&str>,
) -> Option<String> {
    let Some(addresses) = machine.addresses.as_ref() else {
        warn!(
            model = %model_uuid,
            instance_id = %machine.instance_id,
            "failed to get IP address for machine"
        );
        return None;
    };

    let permitted: Vec<&str> = addresses
        .iter()
        .filter(|a| {
            rules.permitted_scopes.iter().any(|s| *s == a.scope)
                && rules.permitted_types.iter().any(|t| *t == a.kind)
        })
        .map(|a| a.value.as_str())
        .collect();

    if let Some(preferred) = permitted
        .iter()
        .find(|v| v.starts_with(&rules.preferred_prefix))
    {
        return Some((*preferred).to_owned());
    }

    permitted
        .iter()
        .find(|v| !v.starts_with(&rules.banned_prefix))
        .map(|v| (*v).to_owned())
        .or_else(|| public_address.map(str::to_owned))
}

/// Collects one model into a canonical [`Model`].
///
/// One collector instance serves one `collect` call; the machine map it
/// accumulates is scoped to that model.
pub struct ModelCollector<'a, C: ClusterClient> {
    client: &'a C,
    uuid: &'a str,
    rules: &'a IpSelectionRules,
    applications: Vec<Application>,
    machines: IndexMap<String, Machine>,
}

impl<'a, C: ClusterClient> ModelCollector<'a, C> {
    pub fn new(client: &'a C, uuid: &'a str, rules: &'a IpSelectionRules) -> Self {
        Self {
            client,
            uuid,
            rules,
            applications: Vec::new(),
            machines: IndexMap::new(),
        }
    }

    /// Fetch and normalize the model.
    ///
    /// Fails with [`CollectError::Unreachable`] when the detail fetch
    /// itself errors, and with [`CollectError::Skipped`] when the model's
    /// provider type is unsupported or an ordinal cannot be parsed --
    /// both mean "leave this model out of the run", not "abort".
    pub async fn collect(mut self) -> Result<Model, CollectError> {
        let detail = self
            .client
            .get_model(self.uuid)
            .await
            .map_err(CollectError::Unreachable)?;

        let model_info = &detail.info;
        if !SUPPORTED_PROVIDERS.contains(&model_info.provider_type.as_str()) {
            return Err(CollectError::Skipped {
                reason: format!(
                    "model '{}' has unsupported provider type '{}'",
                    model_info.name, model_info.provider_type
                ),
            });
        }

        info!(model = %self.uuid, name = %model_info.name, "collecting model");
        for (name, application) in &detail.applications {
            self.add_application(name, &application.charm_name, application.subordinate, &application.units)?;
            info!(model = %self.uuid, application = %name, "collected application");
        }

        let owner = model_info
            .owner_tag
            .strip_prefix("user-")
            .unwrap_or(&model_info.owner_tag)
            .to_owned();
        let cloud = model_info
            .cloud_tag
            .strip_prefix("cloud-")
            .unwrap_or(&model_info.cloud_tag)
            .to_owned();

        Ok(Model {
            uuid: self.uuid.to_owned(),
            name: model_info.name.clone(),
            owner,
            controller_uuid: self.client.controller_uuid().to_owned(),
            cloud,
            applications: self.applications,
            machines: self.machines,
        })
    }

    fn add_application(
        &mut self,
        name: &str,
        charm: &str,
        subordinate: bool,
        units: &[UnitDetail],
    ) -> Result<(), CollectError> {
        let units = units
            .iter()
            .map(|unit| {
                Ok(Unit {
                    ordinal: unit_ordinal(&unit.name)?,
                    name: unit.name.clone(),
                    machine_instance_id: self
                        .add_machine(&unit.machine, unit.public_address.as_deref())?,
                })
            })
            .collect::<Result<Vec<_>, CollectError>>()?;

        self.applications.push(Application {
            name: name.to_owned(),
            charm: charm.to_owned(),
            subordinate,
            units,
        });
        Ok(())
    }

    /// Register the unit's machine in the model's machine map, once per
    /// distinct instance id. Repeated units on the same machine must not
    /// re-register it (the first sighting's IP selection stands).
    ///
    /// Returns the instance id the unit should reference.
    fn add_machine(
        &mut self,
        machine: &MachineDetail,
        public_address: Option<&str>,
    ) -> Result<String, CollectError> {
        if !self.machines.contains_key(&machine.instance_id) {
            let ordinal = machine.id.parse::<i64>().map_err(|_| CollectError::Skipped {
                reason: format!(
                    "machine '{}' has non-numeric id '{}'",
                    machine.instance_id, machine.id
                ),
            })?;
            let ip = select_machine_ip(self.rules, self.uuid, machine, public_address);
            self.machines.insert(
                machine.instance_id.clone(),
                Machine {
                    ordinal,
                    ip,
                    instance_id: machine.instance_id.clone(),
                },
            );
        }

        Ok(machine.instance_id.clone())
    }
}

/// Parse the numeric suffix of a unit name (`{application}/{ordinal}`).
fn unit_ordinal(name: &str) -> Result<i64, CollectError> {
    name.rsplit_once('/')
        .and_then(|(_, suffix)| suffix.parse::<i64>().ok())
        .ok_or_else(|| CollectError::Skipped {
            reason: format!("unit '{name}' has no numeric ordinal suffix"),
        })
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use muster_api::{
        Address, ApplicationDetail, CloudDetail, Error as ApiError, ModelDetail, ModelInfo,
    };

    use super::*;

    // ── Fake controller client ──────────────────────────────────────

    struct FakeClient {
        model: Option<ModelDetail>,
    }

    impl ClusterClient for FakeClient {
        fn controller_name(&self) -> &str {
            "test-ctl"
        }

        fn controller_uuid(&self) -> &str {
            "ctl-uuid-1"
        }

        async fn clouds(&self) -> Result<BTreeMap<String, CloudDetail>, ApiError> {
            Ok(BTreeMap::new())
        }

        async fn model_uuids(&self) -> Result<BTreeMap<String, String>, ApiError> {
            Ok(BTreeMap::new())
        }

        async fn get_model(&self, _uuid: &str) -> Result<ModelDetail, ApiError> {
            self.model.clone().ok_or(ApiError::Api {
                message: "model agent lost".into(),
                status: 500,
            })
        }

        async fn disconnect(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn addr(scope: &str, kind: &str, value: &str) -> Address {
        Address {
            scope: scope.into(),
            kind: kind.into(),
            value: value.into(),
        }
    }

    fn machine_with(addresses: Option<Vec<Address>>) -> MachineDetail {
        MachineDetail {
            id: "0".into(),
            instance_id: "i-000".into(),
            addresses,
        }
    }

    fn unit(name: &str, machine: MachineDetail, public: Option<&str>) -> UnitDetail {
        UnitDetail {
            name: name.into(),
            machine,
            public_address: public.map(str::to_owned),
        }
    }

    fn model_detail(provider_type: &str, applications: Vec<(&str, Vec<UnitDetail>)>) -> ModelDetail {
        ModelDetail {
            info: ModelInfo {
                name: "core".into(),
                owner_tag: "user-admin".into(),
                cloud_tag: "cloud-localhost".into(),
                provider_type: provider_type.into(),
            },
            applications: applications
                .into_iter()
                .map(|(name, units)| {
                    (
                        name.to_owned(),
                        ApplicationDetail {
                            charm_name: name.to_owned(),
                            subordinate: false,
                            units,
                        },
                    )
                })
                .collect(),
        }
    }

    // ── IP heuristic ────────────────────────────────────────────────

    #[test]
    fn preferred_prefix_wins_over_list_order() {
        let rules = IpSelectionRules::default();
        let machine = machine_with(Some(vec![
            addr("local-cloud", "ipv4", "172.17.0.5"),
            addr("local-cloud", "ipv4", "192.168.1.9"),
        ]));

        let ip = select_machine_ip(&rules, "m-1", &machine, Some("10.0.0.1"));
        assert_eq!(ip.as_deref(), Some("192.168.1.9"));
    }

    #[test]
    fn banned_only_addresses_fall_back_to_public() {
        let rules = IpSelectionRules::default();
        let machine = machine_with(Some(vec![addr("local-cloud", "ipv4", "172.17.0.5")]));

        let ip = select_machine_ip(&rules, "m-1", &machine, Some("10.0.0.1"));
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn absent_address_list_yields_no_ip() {
        let rules = IpSelectionRules::default();
        let machine = machine_with(None);

        let ip = select_machine_ip(&rules, "m-1", &machine, None);
        assert_eq!(ip, None);
    }

    #[test]
    fn empty_address_list_still_uses_public() {
        let rules = IpSelectionRules::default();
        let machine = machine_with(Some(vec![]));

        let ip = select_machine_ip(&rules, "m-1", &machine, Some("10.0.0.1"));
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn scope_and_type_filters_apply_before_prefixes() {
        let rules = IpSelectionRules::default();
        // The preferred-looking address is out of scope; the ipv6 one is
        // the wrong type. Only 10.10.0.4 survives the filter.
        let machine = machine_with(Some(vec![
            addr("local-machine", "ipv4", "192.168.9.9"),
            addr("local-cloud", "ipv6", "fe80::1"),
            addr("local-cloud", "ipv4", "10.10.0.4"),
        ]));

        let ip = select_machine_ip(&rules, "m-1", &machine, None);
        assert_eq!(ip.as_deref(), Some("10.10.0.4"));
    }

    #[test]
    fn first_permissible_address_is_order_stable() {
        let rules = IpSelectionRules::default();
        let machine = machine_with(Some(vec![
            addr("local-cloud", "ipv4", "10.0.1.2"),
            addr("local-cloud", "ipv4", "10.0.1.3"),
        ]));

        let ip = select_machine_ip(&rules, "m-1", &machine, None);
        assert_eq!(ip.as_deref(), Some("10.0.1.2"));
    }

    // ── Collection ──────────────────────────────────────────────────

    #[tokio::test]
    async fn collect_normalizes_tags_and_identity() {
        let client = FakeClient {
            model: Some(model_detail("lxd", vec![])),
        };
        let rules = IpSelectionRules::default();

        let model = ModelCollector::new(&client, "m-1", &rules)
            .collect()
            .await
            .expect("collect");

        assert_eq!(model.owner, "admin");
        assert_eq!(model.cloud, "localhost");
        assert_eq!(model.controller_uuid, "ctl-uuid-1");
    }

    #[tokio::test]
    async fn machines_deduplicate_by_instance_id() {
        let shared = MachineDetail {
            id: "3".into(),
            instance_id: "i-shared".into(),
            addresses: Some(vec![addr("local-cloud", "ipv4", "192.168.0.3")]),
        };
        let detail = model_detail(
            "lxd",
            vec![(
                "db",
                vec![
                    unit("db/0", shared.clone(), None),
                    unit("db/1", shared.clone(), None),
                ],
            )],
        );
        let client = FakeClient {
            model: Some(detail),
        };
        let rules = IpSelectionRules::default();

        let model = ModelCollector::new(&client, "m-1", &rules)
            .collect()
            .await
            .expect("collect");

        assert_eq!(model.machines.len(), 1);
        assert_eq!(model.machines["i-shared"].ordinal, 3);
        assert_eq!(model.applications[0].units.len(), 2);
        assert!(
            model.applications[0]
                .units
                .iter()
                .all(|u| u.machine_instance_id == "i-shared")
        );
    }

    #[tokio::test]
    async fn unsupported_provider_is_skipped_not_failed() {
        let client = FakeClient {
            model: Some(model_detail("kubernetes", vec![])),
        };
        let rules = IpSelectionRules::default();

        let result = ModelCollector::new(&client, "m-1", &rules).collect().await;
        assert!(matches!(result, Err(CollectError::Skipped { .. })));
    }

    #[tokio::test]
    async fn fetch_failure_is_unreachable() {
        let client = FakeClient { model: None };
        let rules = IpSelectionRules::default();

        let result = ModelCollector::new(&client, "m-1", &rules).collect().await;
        assert!(matches!(result, Err(CollectError::Unreachable(_))));
    }

    #[tokio::test]
    async fn malformed_unit_name_skips_model() {
        let detail = model_detail(
            "lxd",
            vec![("db", vec![unit("db-leader", machine_with(None), None)])],
        );
        let client = FakeClient {
            model: Some(detail),
        };
        let rules = IpSelectionRules::default();

        let result = ModelCollector::new(&client, "m-1", &rules).collect().await;
        assert!(matches!(result, Err(CollectError::Skipped { .. })));
    }

    #[tokio::test]
    async fn unit_ordinal_comes_from_name_suffix() {
        let detail = model_detail(
            "manual",
            vec![("web", vec![unit("web/12", machine_with(None), None)])],
        );
        let client = FakeClient {
            model: Some(detail),
        };
        let rules = IpSelectionRules::default();

        let model = ModelCollector::new(&client, "m-1", &rules)
            .collect()
            .await
            .expect("collect");
        assert_eq!(model.applications[0].units[0].ordinal, 12);
    }
}

// ── Reconciliation writer capability ──
//
// The orchestrator drives a writer through a fixed lifecycle per run:
// prepare_controller → write_model / write_unreachable_model (per model)
// → finalize_controller → close. `ConsoleWriter` renders the same calls
// as log output for diagnostics; `store::DatabaseWriter` stages and
// merges them transactionally.

use tracing::info;

use crate::entity::{ControllerInfo, Model};
use crate::error::CoreError;

/// Writer lifecycle for one controller run.
pub trait InventoryWriter {
    /// Open the run: provision staging, record controller identity and clouds.
    fn prepare_controller(
        &mut self,
        controller: &ControllerInfo,
    ) -> impl Future<Output = Result<(), CoreError>>;

    /// Write one freshly collected model.
    fn write_model(&mut self, model: &Model) -> impl Future<Output = Result<(), CoreError>>;

    /// Preserve last-known state for a model whose fetch failed.
    fn write_unreachable_model(
        &mut self,
        model_uuid: &str,
    ) -> impl Future<Output = Result<(), CoreError>>;

    /// Reconcile and commit the run.
    fn finalize_controller(&mut self) -> impl Future<Output = Result<(), CoreError>>;

    /// Release resources; discards the run if it was never finalized.
    /// Always called, even when earlier steps failed.
    fn close(&mut self) -> impl Future<Output = Result<(), CoreError>>;
}

/// Side-effect-free writer that renders the run as log output.
///
/// Selected with `--console`; useful for checking what a controller
/// would contribute before pointing a run at the store.
#[derive(Debug, Default)]
pub struct ConsoleWriter;

impl ConsoleWriter {
    pub fn new() -> Self {
        Self
    }
}

impl InventoryWriter for ConsoleWriter {
    async fn prepare_controller(&mut self, controller: &ControllerInfo) -> Result<(), CoreError> {
        let clouds = controller
            .clouds
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        info!("Controller: {} ({})", controller.name, controller.uuid);
        info!(
            "Clouds: {}",
            if clouds.is_empty() { "none" } else { &clouds }
        );
        Ok(())
    }

    async fn write_model(&mut self, model: &Model) -> Result<(), CoreError> {
        info!(
            "Model: {} ({}) owner={} cloud={}",
            model.name, model.uuid, model.owner, model.cloud
        );

        let mut machines: Vec<_> = model.machines.values().collect();
        machines.sort_by_key(|m| m.ordinal);
        if machines.is_empty() {
            info!("  Machines: none");
        }
        for machine in machines {
            info!(
                "  Machine: ordinal={} instance_id={} ip={}",
                machine.ordinal,
                machine.instance_id,
                machine.ip.as_deref().unwrap_or("-")
            );
        }

        let mut applications: Vec<_> = model.applications.iter().collect();
        applications.sort_by(|a, b| a.name.cmp(&b.name));
        if applications.is_empty() {
            info!("  Applications: none");
        }
        for application in applications {
            info!(
                "  Application: {} charm={} subordinate={}",
                application.name, application.charm, application.subordinate
            );
            let mut units: Vec<_> = application.units.iter().collect();
            units.sort_by_key(|u| u.ordinal);
            if units.is_empty() {
                info!("    Units: none");
            }
            for unit in units {
                info!(
                    "    Unit: {} ordinal={} machine_instance_id={}",
                    unit.name, unit.ordinal, unit.machine_instance_id
                );
            }
        }
        Ok(())
    }

    async fn write_unreachable_model(&mut self, model_uuid: &str) -> Result<(), CoreError> {
        info!("Unreachable model: {model_uuid} (would repopulate from store)");
        Ok(())
    }

    async fn finalize_controller(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), CoreError> {
        Ok(())
    }
}

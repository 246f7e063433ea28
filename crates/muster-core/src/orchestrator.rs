// ── Run orchestration ──
//
// One run per configured controller: connect, enumerate, collect each
// model, classify its outcome, and drive the writer lifecycle. Failure
// containment follows the error taxonomy: connect failures are
// run-fatal, per-model failures are contained, finalize failures are
// logged and left to the writer's discard-on-close semantics. The
// writer is closed and the controller disconnected in all cases, in
// that order.

use tracing::{error, info, warn};

use muster_api::{ClusterClient, ClusterConnect, ControllerEndpoint};

use crate::collector::{IpSelectionRules, ModelCollector};
use crate::entity::{Cloud, ControllerInfo};
use crate::error::{CollectError, CoreError};
use crate::writer::InventoryWriter;

/// Drives controller runs. One instance serves any number of sequential
/// runs; it holds no per-run state.
pub struct Orchestrator<C: ClusterConnect> {
    connector: C,
    rules: IpSelectionRules,
}

impl<C: ClusterConnect> Orchestrator<C> {
    pub fn new(connector: C, rules: IpSelectionRules) -> Self {
        Self { connector, rules }
    }

    /// Execute one controller run against the given writer.
    ///
    /// The writer is always closed before this returns, so a run that
    /// never reached `finalize_controller` leaves nothing behind.
    pub async fn run<W: InventoryWriter>(
        &self,
        endpoint: &ControllerEndpoint,
        writer: &mut W,
    ) -> Result<(), CoreError> {
        let handle = match self.connector.connect(endpoint).await {
            Ok(handle) => handle,
            Err(source) => {
                // The run is over before the writer saw any data; close it
                // so an already-opened store transaction is rolled back.
                if let Err(e) = writer.close().await {
                    warn!(controller = %endpoint.name, "failed to close writer: {e}");
                }
                return Err(CoreError::ConnectionFailed {
                    controller: endpoint.name.clone(),
                    source,
                });
            }
        };
        info!(controller = %endpoint.name, "connected to controller");

        let result = self.run_connected(&handle, writer).await;

        if let Err(e) = writer.close().await {
            warn!(controller = %endpoint.name, "failed to close writer: {e}");
        }
        if let Err(e) = handle.disconnect().await {
            warn!(controller = %endpoint.name, "failed to disconnect: {e}");
        }
        result
    }

    async fn run_connected<H: ClusterClient, W: InventoryWriter>(
        &self,
        handle: &H,
        writer: &mut W,
    ) -> Result<(), CoreError> {
        let clouds = handle
            .clouds()
            .await?
            .into_keys()
            .map(|tag| Cloud {
                name: tag.strip_prefix("cloud-").unwrap_or(&tag).to_owned(),
            })
            .collect();
        let controller = ControllerInfo {
            name: handle.controller_name().to_owned(),
            uuid: handle.controller_uuid().to_owned(),
            clouds,
        };
        writer.prepare_controller(&controller).await?;

        let models = handle.model_uuids().await?;
        for uuid in models.values() {
            self.process_model(handle, writer, uuid).await;
        }

        if let Err(e) = writer.finalize_controller().await {
            error!(
                controller = %handle.controller_name(),
                "failed to finalize controller: {e}"
            );
        }
        Ok(())
    }

    /// Collect one model and route it through the writer. Never fails the
    /// run: every per-model outcome is contained here.
    async fn process_model<H: ClusterClient, W: InventoryWriter>(
        &self,
        handle: &H,
        writer: &mut W,
        uuid: &str,
    ) {
        match ModelCollector::new(handle, uuid, &self.rules).collect().await {
            Ok(model) => {
                if let Err(e) = writer.write_model(&model).await {
                    error!(model = %uuid, "failed to write model: {e}");
                }
            }
            Err(CollectError::Unreachable(e)) => {
                error!(model = %uuid, "failed to get model: {e}");
                if let Err(e) = writer.write_unreachable_model(uuid).await {
                    error!(model = %uuid, "failed to repopulate model: {e}");
                }
            }
            Err(CollectError::Skipped { reason }) => {
                info!(model = %uuid, "skipping model: {reason}");
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

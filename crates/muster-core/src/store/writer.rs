// ── Transactional writer ──
//
// Implements the writer lifecycle over `Database` staging operations.
// Ordering invariant within `write_model`: machines are staged before
// units, ascending by ordinal, and the instance-id → store-id map lives
// only for the duration of that one call.

use std::collections::HashMap;

use tracing::warn;

use crate::entity::{ControllerInfo, Model};
use crate::error::CoreError;
use crate::writer::InventoryWriter;

use super::{Database, StoreError};

/// Writer that stages collected entities and merges them on finalize.
///
/// Owns the run's [`Database`]; `close` releases it, rolling back a run
/// that never finalized.
pub struct DatabaseWriter {
    db: Option<Database>,
}

impl DatabaseWriter {
    pub fn new(db: Database) -> Self {
        Self { db: Some(db) }
    }

    fn db_mut(&mut self) -> Result<&mut Database, StoreError> {
        self.db.as_mut().ok_or(StoreError::Closed)
    }
}

impl InventoryWriter for DatabaseWriter {
    async fn prepare_controller(&mut self, controller: &ControllerInfo) -> Result<(), CoreError> {
        let db = self.db_mut()?;
        db.ensure_transaction()?;
        db.setup_staging_tables()?;
        db.insert_clouds(&controller.clouds)?;
        db.insert_controller(controller)?;
        Ok(())
    }

    async fn write_model(&mut self, model: &Model) -> Result<(), CoreError> {
        let db = self.db_mut()?;
        db.ensure_transaction()?;
        db.insert_model(model)?;

        // Machines first: units reference the ids staged here.
        let mut machine_ids: HashMap<&str, i64> = HashMap::new();
        let mut machines: Vec<_> = model.machines.values().collect();
        machines.sort_by_key(|m| m.ordinal);
        for machine in machines {
            let id = db.insert_machine(&model.uuid, machine)?;
            machine_ids.insert(machine.instance_id.as_str(), id);
        }

        for application in &model.applications {
            let application_id = db.insert_application(&model.uuid, application)?;
            for unit in &application.units {
                let Some(&machine_id) = machine_ids.get(unit.machine_instance_id.as_str()) else {
                    // Data-consistency gap, not a fatal error: the unit is
                    // left out of this run.
                    warn!(
                        unit = %unit.name,
                        model = %model.uuid,
                        "missing machine for unit"
                    );
                    continue;
                };
                db.insert_unit(unit, application_id, machine_id)?;
            }
        }
        Ok(())
    }

    async fn write_unreachable_model(&mut self, model_uuid: &str) -> Result<(), CoreError> {
        let db = self.db_mut()?;
        db.ensure_transaction()?;
        db.populate_unreachable_model(model_uuid)?;
        Ok(())
    }

    async fn finalize_controller(&mut self) -> Result<(), CoreError> {
        let db = self.db_mut()?;
        db.ensure_transaction()?;
        db.merge_inventory()?;
        db.commit()?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), CoreError> {
        if let Some(db) = self.db.take() {
            db.close()?;
        }
        Ok(())
    }
}

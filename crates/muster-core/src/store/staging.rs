// ── Staging operations ──
//
// Every staged row is tagged with the run's entry id as `row_source`.
// The two script entry points (`setup_staging_tables`, `merge_inventory`)
// are the opaque "procedures" of the store contract: callers invoke them
// uniformly and never see their SQL. Each operation emits a `debug!`
// line, so a run's full store activity is visible at `-vv`.

use rusqlite::params;
use tracing::debug;

use crate::entity::{Application, Cloud, ControllerInfo, Machine, Model, Unit};

use super::{Database, StoreError, schema};

impl Database {
    /// Provision the session's staging tables. Called once per run,
    /// from `prepare_controller`.
    pub(super) fn setup_staging_tables(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(schema::STAGING_SETUP)?;
        debug!(entry = self.entry_id, "staging tables provisioned");
        Ok(())
    }

    /// Stage the controller's clouds, ignoring duplicates.
    pub(super) fn insert_clouds(&self, clouds: &[Cloud]) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO temp_cloud (row_source, name) VALUES (?1, ?2)
             ON CONFLICT DO NOTHING",
        )?;
        for cloud in clouds {
            stmt.execute(params![self.entry_id, cloud.name])?;
        }
        debug!(entry = self.entry_id, count = clouds.len(), "staged clouds");
        Ok(())
    }

    /// Stage the controller record.
    pub(super) fn insert_controller(&self, controller: &ControllerInfo) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO temp_controller (row_source, name, uuid) VALUES (?1, ?2, ?3)",
            params![self.entry_id, controller.name, controller.uuid],
        )?;
        debug!(controller = %controller.name, "staged controller");
        Ok(())
    }

    /// Stage the model row.
    pub(super) fn insert_model(&self, model: &Model) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO temp_model (uuid, name, owner, controller, cloud, row_source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                model.uuid,
                model.name,
                model.owner,
                model.controller_uuid,
                model.cloud,
                self.entry_id
            ],
        )?;
        debug!(model = %model.uuid, "staged model");
        Ok(())
    }

    /// Stage one machine, keyed by (model, ordinal). Returns the
    /// store-assigned machine id for unit references.
    pub(super) fn insert_machine(
        &self,
        model_uuid: &str,
        machine: &Machine,
    ) -> Result<i64, StoreError> {
        let id = self.conn.query_row(
            "INSERT INTO temp_machine (model, ordinal, ip, instance_id, row_source)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (model, ordinal) DO UPDATE SET model = excluded.model
             RETURNING id",
            params![
                model_uuid,
                machine.ordinal,
                machine.ip,
                machine.instance_id,
                self.entry_id
            ],
            |row| row.get(0),
        )?;
        debug!(model = %model_uuid, ordinal = machine.ordinal, id, "staged machine");
        Ok(id)
    }

    /// Stage one application. Returns the store-assigned application id.
    pub(super) fn insert_application(
        &self,
        model_uuid: &str,
        application: &Application,
    ) -> Result<i64, StoreError> {
        let id = self.conn.query_row(
            "INSERT INTO temp_application (model, name, charm, subordinate, row_source)
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
            params![
                model_uuid,
                application.name,
                application.charm,
                application.subordinate,
                self.entry_id
            ],
            |row| row.get(0),
        )?;
        debug!(model = %model_uuid, application = %application.name, id, "staged application");
        Ok(id)
    }

    /// Stage one unit, referencing store-assigned application and machine ids.
    pub(super) fn insert_unit(
        &self,
        unit: &Unit,
        application_id: i64,
        machine_id: i64,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO temp_unit (ordinal, name, application, machine, row_source)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![unit.ordinal, unit.name, application_id, machine_id, self.entry_id],
        )?;
        debug!(unit = %unit.name, application = application_id, machine = machine_id, "staged unit");
        Ok(())
    }

    /// Fallback reconciliation for a model that could not be observed:
    /// copy its last-known canonical rows into staging, re-tagged with
    /// the current entry but keeping their original primary keys so the
    /// unit references stay resolvable.
    pub(super) fn populate_unreachable_model(&self, model_uuid: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO temp_model (uuid, name, owner, controller, cloud, row_source)
             SELECT uuid, name, owner, controller, cloud, ?1 FROM model WHERE uuid = ?2",
            params![self.entry_id, model_uuid],
        )?;
        self.conn.execute(
            "INSERT INTO temp_application (id, model, name, charm, subordinate, row_source)
             SELECT id, model, name, charm, subordinate, ?1 FROM application WHERE model = ?2",
            params![self.entry_id, model_uuid],
        )?;
        self.conn.execute(
            "INSERT INTO temp_machine (id, model, ordinal, ip, instance_id, row_source)
             SELECT id, model, ordinal, ip, instance_id, ?1 FROM machine WHERE model = ?2",
            params![self.entry_id, model_uuid],
        )?;
        self.conn.execute(
            "INSERT INTO temp_unit (ordinal, name, application, machine, row_source)
             SELECT u.ordinal, u.name, u.application, u.machine, ?1
             FROM unit u JOIN application a ON u.application = a.id
             WHERE a.model = ?2",
            params![self.entry_id, model_uuid],
        )?;
        debug!(model = %model_uuid, "copied last-known model into staging");
        Ok(())
    }

    /// Run the owner-scoped merge: replace this owner's canonical state
    /// with the run's staging content.
    pub(super) fn merge_inventory(&self) -> Result<(), StoreError> {
        for statement in schema::MERGE_DELETE_STATEMENTS {
            self.conn.execute(statement, [self.owner_id])?;
        }
        self.conn.execute_batch(schema::MERGE_INSERT)?;
        debug!(owner = self.owner_id, entry = self.entry_id, "merged staging into canonical tables");
        Ok(())
    }
}

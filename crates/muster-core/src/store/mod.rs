// ── Transactional store ──
//
// `Database` owns a single SQLite connection and one explicit
// transaction scoped to a controller run. The run's Entry row is
// allocated inside that transaction at connect time, so a discarded run
// leaves no trace — not even the entry. Staging operations live in
// `staging`, SQL text in `schema`, the writer lifecycle in `writer`.

mod schema;
mod staging;
mod writer;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;
use tracing::debug;

pub use writer::DatabaseWriter;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An operation was attempted after `close`.
    #[error("store connection already closed")]
    Closed,
}

/// One store connection, exclusively owned by one controller run.
///
/// The transaction opened at connect is the run's atomicity boundary:
/// [`Database::commit`] (reached only through the writer's finalize) makes
/// the run's reconciled state visible; [`Database::close`] rolls back
/// anything still open.
pub struct Database {
    conn: Connection,
    owner_id: i64,
    entry_id: i64,
    txn_open: bool,
}

impl Database {
    /// Open the store, apply the canonical schema, begin the run's
    /// transaction, and allocate its Entry.
    pub fn connect(path: &Path, owner_id: i64) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(schema::CANONICAL_SCHEMA)?;

        let mut db = Self {
            conn,
            owner_id,
            entry_id: 0,
            txn_open: false,
        };
        db.ensure_transaction()?;
        db.entry_id = db.conn.query_row(
            "INSERT INTO entry (owner) VALUES (?1) RETURNING id",
            [owner_id],
            |row| row.get(0),
        )?;
        debug!(owner = owner_id, entry = db.entry_id, "store connected");
        Ok(db)
    }

    /// Provenance tag for every row this run stages.
    pub fn entry_id(&self) -> i64 {
        self.entry_id
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// Begin the run transaction if none is open.
    pub fn ensure_transaction(&mut self) -> Result<(), StoreError> {
        if !self.txn_open {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            self.txn_open = true;
        }
        Ok(())
    }

    pub fn commit(&mut self) -> Result<(), StoreError> {
        if self.txn_open {
            self.conn.execute_batch("COMMIT")?;
            self.txn_open = false;
        }
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<(), StoreError> {
        if self.txn_open {
            self.conn.execute_batch("ROLLBACK")?;
            self.txn_open = false;
        }
        Ok(())
    }

    /// Roll back anything still open and release the connection.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.rollback()?;
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }

    // ── Version negotiation ─────────────────────────────────────────
    //
    // Lets callers target the newest schema-supported revision of a
    // named view or procedure without a lockstep deploy. Not consulted
    // by the default write path.

    /// Supported version numbers for a named view.
    pub fn view_versions(&self, name: &str) -> Result<Vec<i64>, StoreError> {
        self.component_versions(&format!("views:{name}"))
    }

    /// Supported version numbers for a named procedure.
    pub fn procedure_versions(&self, name: &str) -> Result<Vec<i64>, StoreError> {
        self.component_versions(&format!("procs:{name}"))
    }

    /// Highest supported version for a named view, if any.
    pub fn best_view(&self, name: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.view_versions(name)?.into_iter().max())
    }

    /// Highest supported version for a named procedure, if any.
    pub fn best_procedure(&self, name: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.procedure_versions(name)?.into_iter().max())
    }

    fn component_versions(&self, component: &str) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT version FROM versions WHERE component = ?1 AND supported = TRUE ORDER BY version",
        )?;
        let versions = stmt
            .query_map([component], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(versions)
    }
}

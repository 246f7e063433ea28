// ── Schema and server-side scripts ──
//
// Owns every piece of SQL text: canonical DDL, the staging-table setup
// script, and the merge script. Nothing outside `store` sees this text;
// callers invoke the scripts through the two store entry points
// (`setup_staging_tables`, `merge_inventory`) and treat them as opaque.

/// Canonical tables plus the versions registry. Idempotent; applied at
/// every store connect.
pub(super) const CANONICAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entry (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    owner      INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cloud (
    name       TEXT NOT NULL UNIQUE,
    row_source INTEGER NOT NULL REFERENCES entry (id)
);

CREATE TABLE IF NOT EXISTS controller (
    name       TEXT NOT NULL,
    uuid       TEXT NOT NULL,
    row_source INTEGER NOT NULL REFERENCES entry (id)
);

CREATE TABLE IF NOT EXISTS model (
    uuid       TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    owner      TEXT NOT NULL,
    controller TEXT NOT NULL,
    cloud      TEXT NOT NULL,
    row_source INTEGER NOT NULL REFERENCES entry (id)
);

CREATE TABLE IF NOT EXISTS application (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    model       TEXT NOT NULL REFERENCES model (uuid),
    name        TEXT NOT NULL,
    charm       TEXT NOT NULL,
    subordinate INTEGER NOT NULL,
    row_source  INTEGER NOT NULL REFERENCES entry (id)
);

CREATE TABLE IF NOT EXISTS machine (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    model       TEXT NOT NULL REFERENCES model (uuid),
    ordinal     INTEGER NOT NULL,
    ip          TEXT,
    instance_id TEXT NOT NULL,
    row_source  INTEGER NOT NULL REFERENCES entry (id),
    UNIQUE (model, ordinal)
);

CREATE TABLE IF NOT EXISTS unit (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    ordinal     INTEGER NOT NULL,
    name        TEXT NOT NULL,
    application INTEGER NOT NULL REFERENCES application (id),
    machine     INTEGER NOT NULL REFERENCES machine (id),
    row_source  INTEGER NOT NULL REFERENCES entry (id)
);

CREATE TABLE IF NOT EXISTS versions (
    component TEXT NOT NULL,
    version   INTEGER NOT NULL,
    supported INTEGER NOT NULL DEFAULT 1,
    UNIQUE (component, version)
);

INSERT OR IGNORE INTO versions (component, version, supported) VALUES
    ('procs:setup_inventory_staging', 1, TRUE),
    ('procs:merge_inventory', 1, TRUE),
    ('views:model_summary', 1, TRUE);

CREATE VIEW IF NOT EXISTS model_summary_v1 AS
    SELECT m.uuid, m.name, m.owner, m.cloud,
           COUNT(DISTINCT a.id) AS applications,
           COUNT(u.id) AS units
    FROM model m
    LEFT JOIN application a ON a.model = m.uuid
    LEFT JOIN unit u ON u.application = a.id
    GROUP BY m.uuid;
";

/// Session-scoped staging tables, one set per run.
///
/// The id sequences for machine and application staging are seeded above
/// the canonical maxima: the unreachable-model fallback copies canonical
/// rows into staging with their original primary keys, and freshly staged
/// rows must not collide with them.
pub(super) const STAGING_SETUP: &str = "
CREATE TEMP TABLE temp_cloud (
    row_source INTEGER NOT NULL,
    name       TEXT NOT NULL UNIQUE
);

CREATE TEMP TABLE temp_controller (
    row_source INTEGER NOT NULL,
    name       TEXT NOT NULL,
    uuid       TEXT NOT NULL
);

CREATE TEMP TABLE temp_model (
    uuid       TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    owner      TEXT NOT NULL,
    controller TEXT NOT NULL,
    cloud      TEXT NOT NULL,
    row_source INTEGER NOT NULL
);

CREATE TEMP TABLE temp_application (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    model       TEXT NOT NULL,
    name        TEXT NOT NULL,
    charm       TEXT NOT NULL,
    subordinate INTEGER NOT NULL,
    row_source  INTEGER NOT NULL
);

CREATE TEMP TABLE temp_machine (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    model       TEXT NOT NULL,
    ordinal     INTEGER NOT NULL,
    ip          TEXT,
    instance_id TEXT NOT NULL,
    row_source  INTEGER NOT NULL,
    UNIQUE (model, ordinal)
);

CREATE TEMP TABLE temp_unit (
    ordinal     INTEGER NOT NULL,
    name        TEXT NOT NULL,
    application INTEGER NOT NULL,
    machine     INTEGER NOT NULL,
    row_source  INTEGER NOT NULL
);

DELETE FROM temp.sqlite_sequence WHERE name IN ('temp_machine', 'temp_application');
INSERT INTO temp.sqlite_sequence (name, seq)
    SELECT 'temp_machine', COALESCE((SELECT MAX(id) FROM machine), 0);
INSERT INTO temp.sqlite_sequence (name, seq)
    SELECT 'temp_application', COALESCE((SELECT MAX(id) FROM application), 0);
";

/// Owner-scoped merge: reconcile canonical tables from staging content.
///
/// Each statement takes the owner id as its single parameter. Previous
/// canonical state belonging to this owner (any earlier entry) is deleted,
/// then the current run's staging rows are inserted. Application and
/// machine rows get fresh canonical ids; unit references are resolved
/// through the staging ids, so canonical id allocation never depends on
/// staging rowids.
pub(super) const MERGE_DELETE_STATEMENTS: &[&str] = &[
    "DELETE FROM unit WHERE row_source IN (SELECT id FROM entry WHERE owner = ?1)",
    "DELETE FROM machine WHERE row_source IN (SELECT id FROM entry WHERE owner = ?1)",
    "DELETE FROM application WHERE row_source IN (SELECT id FROM entry WHERE owner = ?1)",
    "DELETE FROM model WHERE row_source IN (SELECT id FROM entry WHERE owner = ?1)",
    "DELETE FROM controller WHERE row_source IN (SELECT id FROM entry WHERE owner = ?1)",
    "DELETE FROM cloud WHERE row_source IN (SELECT id FROM entry WHERE owner = ?1)",
];

/// Second half of the merge: insert the run's staging content into
/// canonical tables, in referential dependency order.
pub(super) const MERGE_INSERT: &str = "
INSERT OR IGNORE INTO cloud (name, row_source)
    SELECT name, row_source FROM temp_cloud;

INSERT INTO controller (name, uuid, row_source)
    SELECT name, uuid, row_source FROM temp_controller;

INSERT INTO model (uuid, name, owner, controller, cloud, row_source)
    SELECT uuid, name, owner, controller, cloud, row_source FROM temp_model;

INSERT INTO machine (model, ordinal, ip, instance_id, row_source)
    SELECT model, ordinal, ip, instance_id, row_source FROM temp_machine;

INSERT INTO application (model, name, charm, subordinate, row_source)
    SELECT model, name, charm, subordinate, row_source FROM temp_application;

INSERT INTO unit (ordinal, name, application, machine, row_source)
    SELECT tu.ordinal, tu.name, a.id, m.id, tu.row_source
    FROM temp_unit tu
    JOIN temp_application ta ON tu.application = ta.id
    JOIN application a
        ON a.model = ta.model AND a.name = ta.name AND a.row_source = ta.row_source
    JOIN temp_machine tm ON tu.machine = tm.id
    JOIN machine m
        ON m.model = tm.model AND m.ordinal = tm.ordinal AND m.row_source = tm.row_source;
";

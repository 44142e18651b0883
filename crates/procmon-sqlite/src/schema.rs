use procmon_core::error::{StoreError, StoreResult};
use rusqlite::Connection;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Create all projection tables if they do not exist yet.
///
/// Cross-entity references (instance → process, variable → instance) are
/// logical only. Topics are consumed concurrently with no relative ordering,
/// so a variable may legitimately arrive before its instance.
pub fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_meta (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            schema_version INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS processes (
            process_definition_key INTEGER PRIMARY KEY,
            bpmn_process_id TEXT NOT NULL,
            version INTEGER NOT NULL,
            deployment_time INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_processes_bpmn_process_id
            ON processes(bpmn_process_id, version);

        CREATE TABLE IF NOT EXISTS bpmn_resources (
            process_definition_key INTEGER PRIMARY KEY,
            bpmn_process_id TEXT NOT NULL,
            resource TEXT NOT NULL
        );

        -- One resource per process id: redeploying a process id is rejected
        CREATE UNIQUE INDEX IF NOT EXISTS idx_bpmn_resources_bpmn_process_id
            ON bpmn_resources(bpmn_process_id);

        CREATE TABLE IF NOT EXISTS instances (
            process_instance_key INTEGER PRIMARY KEY,
            process_definition_key INTEGER NOT NULL,
            version INTEGER NOT NULL,
            status TEXT NOT NULL,
            start_time INTEGER NOT NULL,
            end_time INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_instances_definition
            ON instances(process_definition_key);

        CREATE TABLE IF NOT EXISTS variables (
            process_instance_key INTEGER NOT NULL,
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            time INTEGER NOT NULL,
            PRIMARY KEY (process_instance_key, name)
        );

        CREATE TABLE IF NOT EXISTS incidents (
            key INTEGER PRIMARY KEY,
            process_instance_key INTEGER NOT NULL,
            element_id TEXT NOT NULL,
            error_type TEXT NOT NULL,
            error_message TEXT NOT NULL,
            state TEXT NOT NULL,
            time INTEGER NOT NULL,
            resolve_time INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_incidents_instance
            ON incidents(process_instance_key);

        CREATE TABLE IF NOT EXISTS jobs (
            key INTEGER PRIMARY KEY,
            element_id TEXT NOT NULL,
            process_instance_key INTEGER NOT NULL,
            type TEXT NOT NULL,
            retries INTEGER NOT NULL,
            worker TEXT NOT NULL,
            state TEXT NOT NULL,
            time INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_instance
            ON jobs(process_instance_key);

        CREATE TABLE IF NOT EXISTS audit_log (
            partition_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            process_instance_key INTEGER NOT NULL,
            element_id TEXT NOT NULL,
            element_type TEXT NOT NULL,
            intent TEXT NOT NULL,
            time INTEGER NOT NULL,
            PRIMARY KEY (partition_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_audit_log_instance
            ON audit_log(process_instance_key, partition_id, position);
        "#,
    )
    .map_err(|e| StoreError::Database(e.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (0, ?1)",
        [SCHEMA_VERSION as i64],
    )
    .map_err(|e| StoreError::Database(e.to_string()))?;

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(StoreError::Database(format!(
            "database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    Ok(())
}

pub fn schema_version(conn: &Connection) -> StoreResult<u32> {
    let version: i64 = conn
        .query_row(
            "SELECT schema_version FROM store_meta WHERE id = 0",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(version as u32)
}

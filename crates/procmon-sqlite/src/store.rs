use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use procmon_core::{
    error::{StoreError, StoreResult},
    AuditLogEntry, DeployedProcess, NewIncident, NewJob, StateStore, StoreConfig,
};
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use std::sync::Arc;
use std::time::Duration;

use crate::model::{
    AuditLogRow, Incident, Instance, InstanceStatus, Job, Process, StoreCounts, Variable,
};
use crate::schema;
use procmon_core::intent::incident_state;

/// SQLite-backed state store
///
/// A single connection guarded by a mutex; every mutation is its own
/// statement (or transaction, for deployments), so calls from different topic
/// workers serialize without cross-entity transactions.
pub struct SqliteStateStore {
    conn: Arc<Mutex<Connection>>,
    config: StoreConfig,
}

impl SqliteStateStore {
    pub fn open(cfg: StoreConfig) -> StoreResult<Self> {
        // Create parent directory if needed
        if let Some(parent) = cfg.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open_with_flags(
            &cfg.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(db_err)?;

        Self::configure_connection(&conn, &cfg)?;
        schema::init_schema(&conn)?;

        tracing::debug!(path = %cfg.path.display(), "opened state store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: cfg,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn schema_version(&self) -> StoreResult<u32> {
        schema::schema_version(&self.conn.lock())
    }

    fn configure_connection(conn: &Connection, cfg: &StoreConfig) -> StoreResult<()> {
        if cfg.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(db_err)?;
        }

        conn.pragma_update(None, "synchronous", cfg.synchronous.as_pragma())
            .map_err(db_err)?;

        conn.pragma_update(None, "cache_size", cfg.cache_size)
            .map_err(db_err)?;

        conn.busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))
            .map_err(db_err)?;

        Ok(())
    }

    fn finish_instance(
        &self,
        instance_key: i64,
        status: InstanceStatus,
        end_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE instances SET status = ?1, end_time = ?2
                 WHERE process_instance_key = ?3 AND status = ?4",
                params![
                    status.as_str(),
                    end_time.timestamp_millis(),
                    instance_key,
                    InstanceStatus::Active.as_str(),
                ],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "active process instance {}",
                instance_key
            )));
        }
        Ok(())
    }

    pub fn process(&self, definition_key: i64) -> StoreResult<Option<Process>> {
        self.conn
            .lock()
            .query_row(
                "SELECT process_definition_key, bpmn_process_id, version, deployment_time
                 FROM processes WHERE process_definition_key = ?1",
                [definition_key],
                |row| {
                    Ok(Process {
                        definition_key: row.get(0)?,
                        bpmn_process_id: row.get(1)?,
                        version: row.get(2)?,
                        deployment_time: time_at(row, 3)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    /// Base64-encoded BPMN XML of a deployed process.
    pub fn bpmn_resource(&self, definition_key: i64) -> StoreResult<Option<String>> {
        self.conn
            .lock()
            .query_row(
                "SELECT resource FROM bpmn_resources WHERE process_definition_key = ?1",
                [definition_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
    }

    pub fn instance(&self, instance_key: i64) -> StoreResult<Option<Instance>> {
        self.conn
            .lock()
            .query_row(
                "SELECT process_instance_key, process_definition_key, version, status,
                        start_time, end_time
                 FROM instances WHERE process_instance_key = ?1",
                [instance_key],
                |row| {
                    let status: String = row.get(3)?;
                    Ok(Instance {
                        instance_key: row.get(0)?,
                        definition_key: row.get(1)?,
                        version: row.get(2)?,
                        status: status.parse().map_err(|e: String| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Text,
                                e.into(),
                            )
                        })?,
                        start_time: time_at(row, 4)?,
                        end_time: opt_time_at(row, 5)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    pub fn variable(&self, instance_key: i64, name: &str) -> StoreResult<Option<Variable>> {
        self.conn
            .lock()
            .query_row(
                "SELECT process_instance_key, name, value, time
                 FROM variables WHERE process_instance_key = ?1 AND name = ?2",
                params![instance_key, name],
                |row| {
                    Ok(Variable {
                        instance_key: row.get(0)?,
                        name: row.get(1)?,
                        value: row.get(2)?,
                        time: time_at(row, 3)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    pub fn incident(&self, key: i64) -> StoreResult<Option<Incident>> {
        self.conn
            .lock()
            .query_row(
                "SELECT key, process_instance_key, element_id, error_type, error_message,
                        state, time, resolve_time
                 FROM incidents WHERE key = ?1",
                [key],
                |row| {
                    Ok(Incident {
                        key: row.get(0)?,
                        instance_key: row.get(1)?,
                        element_id: row.get(2)?,
                        error_type: row.get(3)?,
                        error_message: row.get(4)?,
                        state: row.get(5)?,
                        time: time_at(row, 6)?,
                        resolve_time: opt_time_at(row, 7)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    pub fn job(&self, key: i64) -> StoreResult<Option<Job>> {
        self.conn
            .lock()
            .query_row(
                "SELECT key, element_id, process_instance_key, type, retries, worker, state, time
                 FROM jobs WHERE key = ?1",
                [key],
                |row| {
                    Ok(Job {
                        key: row.get(0)?,
                        element_id: row.get(1)?,
                        instance_key: row.get(2)?,
                        job_type: row.get(3)?,
                        retries: row.get(4)?,
                        worker: row.get(5)?,
                        state: row.get(6)?,
                        time: time_at(row, 7)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    /// Audit trail of one instance, in partition/position order.
    pub fn audit_log(&self, instance_key: i64) -> StoreResult<Vec<AuditLogRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT partition_id, position, process_instance_key, element_id,
                        element_type, intent, time
                 FROM audit_log WHERE process_instance_key = ?1
                 ORDER BY partition_id, position",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([instance_key], |row| {
                Ok(AuditLogRow {
                    partition_id: row.get(0)?,
                    position: row.get(1)?,
                    instance_key: row.get(2)?,
                    element_id: row.get(3)?,
                    element_type: row.get(4)?,
                    intent: row.get(5)?,
                    timestamp: row.get(6)?,
                })
            })
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;

        Ok(rows)
    }

    pub fn counts(&self) -> StoreResult<StoreCounts> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> StoreResult<u64> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(db_err)
        };

        Ok(StoreCounts {
            processes: count("SELECT COUNT(*) FROM processes")?,
            instances: count("SELECT COUNT(*) FROM instances")?,
            active_instances: count("SELECT COUNT(*) FROM instances WHERE status = 'ACTIVE'")?,
            variables: count("SELECT COUNT(*) FROM variables")?,
            incidents: count("SELECT COUNT(*) FROM incidents")?,
            open_incidents: count("SELECT COUNT(*) FROM incidents WHERE state = 'CREATED'")?,
            jobs: count("SELECT COUNT(*) FROM jobs")?,
            audit_log: count("SELECT COUNT(*) FROM audit_log")?,
        })
    }
}

impl StateStore for SqliteStateStore {
    fn process_deployed(&self, process: &DeployedProcess) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        tx.execute(
            "INSERT INTO processes
             (process_definition_key, bpmn_process_id, version, deployment_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                process.definition_key,
                process.bpmn_process_id,
                process.version,
                process.deployment_time.timestamp_millis(),
            ],
        )
        .map_err(|e| insert_err(e, || format!("process {}", process.definition_key)))?;

        tx.execute(
            "INSERT INTO bpmn_resources (process_definition_key, bpmn_process_id, resource)
             VALUES (?1, ?2, ?3)",
            params![
                process.definition_key,
                process.bpmn_process_id,
                BASE64.encode(&process.resource),
            ],
        )
        .map_err(|e| {
            insert_err(e, || {
                format!("bpmn resource for process '{}'", process.bpmn_process_id)
            })
        })?;

        tx.commit().map_err(db_err)
    }

    fn process_instance_activated(
        &self,
        instance_key: i64,
        definition_key: i64,
        version: i64,
        start_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO instances
                 (process_instance_key, process_definition_key, version, status, start_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    instance_key,
                    definition_key,
                    version,
                    InstanceStatus::Active.as_str(),
                    start_time.timestamp_millis(),
                ],
            )
            .map_err(|e| insert_err(e, || format!("process instance {}", instance_key)))?;
        Ok(())
    }

    fn process_instance_completed(
        &self,
        instance_key: i64,
        end_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.finish_instance(instance_key, InstanceStatus::Completed, end_time)
    }

    fn process_instance_terminated(
        &self,
        instance_key: i64,
        end_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.finish_instance(instance_key, InstanceStatus::Terminated, end_time)
    }

    fn variable_created(
        &self,
        instance_key: i64,
        name: &str,
        value: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO variables (process_instance_key, name, value, time)
                 VALUES (?1, ?2, ?3, ?4)",
                params![instance_key, name, value, time.timestamp_millis()],
            )
            .map_err(|e| insert_err(e, || format!("variable {}/{}", instance_key, name)))?;
        Ok(())
    }

    fn variable_updated(
        &self,
        instance_key: i64,
        name: &str,
        value: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE variables SET value = ?1, time = ?2
                 WHERE process_instance_key = ?3 AND name = ?4",
                params![value, time.timestamp_millis(), instance_key, name],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!(
                "variable {}/{}",
                instance_key, name
            )));
        }
        Ok(())
    }

    fn incident_created(&self, incident: &NewIncident) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO incidents
                 (key, process_instance_key, element_id, error_type, error_message, state, time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    incident.key,
                    incident.instance_key,
                    incident.element_id,
                    incident.error_type,
                    incident.error_message,
                    incident_state::CREATED,
                    incident.time.timestamp_millis(),
                ],
            )
            .map_err(|e| insert_err(e, || format!("incident {}", incident.key)))?;
        Ok(())
    }

    fn incident_resolved(&self, key: i64, time: DateTime<Utc>) -> StoreResult<()> {
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE incidents SET state = ?1, resolve_time = ?2 WHERE key = ?3",
                params![incident_state::RESOLVED, time.timestamp_millis(), key],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("incident {}", key)));
        }
        Ok(())
    }

    fn job_created(&self, job: &NewJob) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO jobs
                 (key, element_id, process_instance_key, type, retries, worker, state, time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    job.key,
                    job.element_id,
                    job.instance_key,
                    job.job_type,
                    job.retries,
                    job.worker,
                    procmon_core::intent::job::CREATED,
                    job.time.timestamp_millis(),
                ],
            )
            .map_err(|e| insert_err(e, || format!("job {}", job.key)))?;
        Ok(())
    }

    fn job_updated(
        &self,
        key: i64,
        retries: i64,
        worker: &str,
        state: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE jobs SET retries = ?1, worker = ?2, state = ?3, time = ?4 WHERE key = ?5",
                params![retries, worker, state, time.timestamp_millis(), key],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("job {}", key)));
        }
        Ok(())
    }

    fn audit_log_event_occurred(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO audit_log
                 (partition_id, position, process_instance_key, element_id, element_type,
                  intent, time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.partition_id,
                    entry.position,
                    entry.instance_key,
                    entry.element_id,
                    entry.element_type,
                    entry.intent,
                    entry.timestamp,
                ],
            )
            .map_err(|e| {
                insert_err(e, || {
                    format!("audit entry {}/{}", entry.partition_id, entry.position)
                })
            })?;
        Ok(())
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Map a failed insert, reporting key collisions as `AlreadyExists`.
fn insert_err(e: rusqlite::Error, what: impl FnOnce() -> String) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::AlreadyExists(what())
        }
        other => db_err(other),
    }
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn opt_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(ms) => DateTime::from_timestamp_millis(ms)
            .map(Some)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms)),
        None => Ok(None),
    }
}

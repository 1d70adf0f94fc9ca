//! SQLite job store and the gateway over it.
//!
//! The store holds the scan job's definition and its trigger registration
//! state. [`SqliteGateway`] is the [`SchedulerGateway`] the reconciliation
//! listener talks to; the row-level functions are shared with the tick
//! engine, which polls over its own connection.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::db::init_db;
use crate::error::{Result, SchedulerError};
use crate::gateway::{GatewayOp, SchedulerGateway};
use crate::schedule::compute_next_run;
use crate::types::{JobId, ScanJob, Schedule, TriggerState};

/// Insert the job definition if it is not present yet.
///
/// A freshly seeded job has no trigger (`state = 'none'`); registration is
/// the reconciler's call to make. Returns `true` when the row was inserted,
/// i.e. this is a fresh install of the job definition.
pub fn seed_scan_job(
    conn: &Connection,
    job: &JobId,
    name: &str,
    schedule: &Schedule,
) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let schedule_json = serde_json::to_string(schedule)
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;

    let n = conn.execute(
        "INSERT OR IGNORE INTO scan_jobs
         (id, name, schedule, state, last_run, next_run, run_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'none', NULL, NULL, 0, ?4, ?4)",
        rusqlite::params![job.as_str(), name, schedule_json, now],
    )?;
    Ok(n > 0)
}

/// Read the job's trigger registration state.
pub fn trigger_state(conn: &Connection, job: &JobId) -> Result<TriggerState> {
    let state: Option<String> = conn
        .query_row(
            "SELECT state FROM scan_jobs WHERE id = ?1",
            [job.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match state {
        Some(s) => Ok(TriggerState::from_store(&s)),
        None => Err(SchedulerError::JobNotFound {
            id: job.as_str().to_string(),
        }),
    }
}

/// Load the full job record.
pub fn load_job(conn: &Connection, job: &JobId) -> Result<ScanJob> {
    let row = conn
        .query_row(
            "SELECT id, name, schedule, state, last_run, next_run,
                    run_count, created_at, updated_at
             FROM scan_jobs WHERE id = ?1",
            [job.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            },
        )
        .optional()?;

    let Some((id, name, sched_json, state, last_run, next_run, run_count, created_at, updated_at)) =
        row
    else {
        return Err(SchedulerError::JobNotFound {
            id: job.as_str().to_string(),
        });
    };

    let schedule: Schedule = serde_json::from_str(&sched_json)
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;

    Ok(ScanJob {
        id,
        name,
        schedule,
        state: TriggerState::from_store(&state),
        last_run,
        next_run,
        run_count,
        created_at,
        updated_at,
    })
}

/// Register the job's trigger: state goes `normal` and `next_run` is
/// computed from the stored schedule.
pub fn activate_trigger(conn: &Connection, job: &JobId) -> Result<()> {
    let sched_json: Option<String> = conn
        .query_row(
            "SELECT schedule FROM scan_jobs WHERE id = ?1",
            [job.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(sched_json) = sched_json else {
        return Err(SchedulerError::JobNotFound {
            id: job.as_str().to_string(),
        });
    };

    let schedule: Schedule = serde_json::from_str(&sched_json)
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;

    let now = Utc::now();
    let next = compute_next_run(&schedule, now).to_rfc3339();
    conn.execute(
        "UPDATE scan_jobs SET state = 'normal', next_run = ?1, updated_at = ?2
         WHERE id = ?3",
        rusqlite::params![next, now.to_rfc3339(), job.as_str()],
    )?;
    Ok(())
}

/// Drop the job's trigger: state goes `none`, `next_run` is cleared. The
/// definition row stays.
pub fn clear_trigger(conn: &Connection, job: &JobId) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let n = conn.execute(
        "UPDATE scan_jobs SET state = 'none', next_run = NULL, updated_at = ?1
         WHERE id = ?2",
        rusqlite::params![now, job.as_str()],
    )?;
    if n == 0 {
        return Err(SchedulerError::JobNotFound {
            id: job.as_str().to_string(),
        });
    }
    Ok(())
}

/// [`SchedulerGateway`] backed by the SQLite job store.
///
/// Holds its own connection so gateway calls never contend with the engine's
/// polling connection.
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Full record lookup, for startup logging and operator inspection.
    pub fn job(&self, job: &JobId) -> Result<ScanJob> {
        let conn = self.conn.lock().expect("store connection poisoned");
        load_job(&conn, job)
    }

    /// Seed the job definition if missing. See [`seed_scan_job`].
    pub fn seed(&self, job: &JobId, name: &str, schedule: &Schedule) -> Result<bool> {
        let conn = self.conn.lock().expect("store connection poisoned");
        seed_scan_job(&conn, job, name, schedule)
    }
}

impl SchedulerGateway for SqliteGateway {
    fn trigger_state(&self, job: &JobId) -> Result<TriggerState> {
        let conn = self.conn.lock().expect("store connection poisoned");
        trigger_state(&conn, job)
    }

    fn schedule(&self, job: &JobId) -> Result<()> {
        let conn = self.conn.lock().expect("store connection poisoned");
        activate_trigger(&conn, job)
            .map_err(|e| SchedulerError::scheduling(GatewayOp::Schedule, job, e))?;
        info!(job_id = %job, "scan job trigger registered");
        Ok(())
    }

    fn unschedule(&self, job: &JobId) -> Result<()> {
        let conn = self.conn.lock().expect("store connection poisoned");
        clear_trigger(&conn, job)
            .map_err(|e| SchedulerError::scheduling(GatewayOp::Unschedule, job, e))?;
        info!(job_id = %job, "scan job trigger dropped");
        Ok(())
    }
}

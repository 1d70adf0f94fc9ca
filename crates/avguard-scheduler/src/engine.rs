use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::db::init_db;
use crate::error::Result;
use crate::schedule::compute_next_run;
use crate::types::Schedule;

/// Notice that the scan job fired, forwarded to the scan dispatch task.
#[derive(Debug, Clone, Serialize)]
pub struct FiredScan {
    pub job_id: String,
    pub name: String,
    /// Total firings including this one.
    pub run_count: u32,
    /// RFC 3339 instant of this firing.
    pub fired_at: String,
}

/// Drives scan-job execution: polls the store every second and fires any
/// job whose trigger is registered and whose `next_run` has arrived.
///
/// The engine only executes; it never registers or drops triggers — that is
/// the reconciliation listener's job through the gateway.
pub struct ScanJobEngine {
    conn: Connection,
    /// If set, fired notices are sent here for scan dispatch.
    fired_tx: Option<mpsc::Sender<FiredScan>>,
}

impl ScanJobEngine {
    /// Create a new engine, initialising the DB schema if needed.
    ///
    /// The sender is non-blocking (`try_send`) so the tick loop is never
    /// stalled by a slow consumer.
    pub fn new(conn: Connection, fired_tx: Option<mpsc::Sender<FiredScan>>) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self { conn, fired_tx })
    }

    /// Main event loop. Polls every second until `shutdown` broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("scan job engine started");

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick() {
                        error!("scan engine tick error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scan job engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire every due job: bump the run counter, advance `next_run`, and
    /// forward a notice to the dispatch channel.
    fn tick(&mut self) -> Result<()> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        // Collect eagerly so `stmt` is dropped before the UPDATE below
        // borrows the connection again.
        let due: Vec<(String, String, String, u32)> = {
            let mut stmt = self.conn.prepare_cached(
                "SELECT id, name, schedule, run_count FROM scan_jobs
                 WHERE state = 'normal' AND next_run IS NOT NULL AND next_run <= ?1",
            )?;
            let rows: Vec<_> = stmt
                .query_map([&now_str], |row| {
                    Ok((
                        row.get::<_, String>(0)?, // id
                        row.get::<_, String>(1)?, // name
                        row.get::<_, String>(2)?, // schedule JSON
                        row.get::<_, u32>(3)?,    // run_count
                    ))
                })?
                .filter_map(|r| r.ok())
                .collect();
            rows
        };

        for (id, name, sched_json, run_count) in due {
            let schedule: Schedule = match serde_json::from_str(&sched_json) {
                Ok(s) => s,
                Err(e) => {
                    error!(job_id = %id, "bad schedule JSON: {e}");
                    continue;
                }
            };

            let new_count = run_count + 1;
            let next = compute_next_run(&schedule, now).to_rfc3339();

            info!(job_id = %id, %name, run = new_count, next_run = %next, "scan job fired");

            self.conn.execute(
                "UPDATE scan_jobs SET last_run = ?1, next_run = ?2,
                  run_count = ?3, updated_at = ?1
                 WHERE id = ?4",
                rusqlite::params![now_str, next, new_count, id],
            )?;

            if let Some(ref tx) = self.fired_tx {
                let notice = FiredScan {
                    job_id: id.clone(),
                    name: name.clone(),
                    run_count: new_count,
                    fired_at: now_str.clone(),
                };
                // try_send never blocks the tick loop; a full channel drops
                // the notice with a warning.
                if tx.try_send(notice).is_err() {
                    warn!(job_id = %id, "scan dispatch channel full or closed — notice dropped");
                }
            }
        }
        Ok(())
    }
}

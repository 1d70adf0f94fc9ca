use rusqlite::Connection;

use crate::error::Result;

/// Initialise the scan-job schema in `conn`.
///
/// Idempotent; safe to run on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scan_jobs (
            id          TEXT    NOT NULL PRIMARY KEY,
            name        TEXT    NOT NULL,
            schedule    TEXT    NOT NULL,   -- JSON-encoded Schedule enum
            state       TEXT    NOT NULL DEFAULT 'none', -- trigger registration state
            last_run    TEXT,               -- RFC 3339 or NULL
            next_run    TEXT,               -- RFC 3339 or NULL
            run_count   INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_scan_jobs_next_run ON scan_jobs (next_run);
        ",
    )?;
    Ok(())
}

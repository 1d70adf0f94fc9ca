use thiserror::Error;

use crate::gateway::GatewayOp;

/// Errors from the scheduling subsystem.
///
/// Two failure classes matter to callers: state-lookup failures
/// (`Database`, `JobNotFound` — the job's trigger state cannot be resolved)
/// and `Scheduling` (a gateway mutation failed). Neither is retried here;
/// recovery is the next post-init recheck or operator action.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No job definition with the given id exists in the store.
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    /// The stored schedule definition cannot be parsed.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// A gateway schedule/unschedule call failed.
    #[error("{op} failed for job '{id}': {source}")]
    Scheduling {
        op: GatewayOp,
        id: String,
        #[source]
        source: Box<SchedulerError>,
    },
}

impl SchedulerError {
    pub fn scheduling(op: GatewayOp, id: &crate::types::JobId, source: SchedulerError) -> Self {
        SchedulerError::Scheduling {
            op,
            id: id.as_str().to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

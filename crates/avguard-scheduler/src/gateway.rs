use std::fmt;

use crate::error::Result;
use crate::types::{JobId, TriggerState};

/// Abstraction over the host's job-scheduling subsystem.
///
/// Calls are synchronous and blocking over a strongly consistent store; a
/// reconciliation sequence reads state, decides, and applies without another
/// writer interleaving (callers serialize per [`JobId`]).
pub trait SchedulerGateway: Send + Sync {
    /// Resolve the job's current trigger state.
    ///
    /// Fails when the job definition itself cannot be found — the caller
    /// cannot reconcile a job it cannot see.
    fn trigger_state(&self, job: &JobId) -> Result<TriggerState>;

    /// Register the job's trigger so it starts firing.
    fn schedule(&self, job: &JobId) -> Result<()>;

    /// Drop the job's trigger so it stops firing. The definition stays.
    fn unschedule(&self, job: &JobId) -> Result<()>;
}

/// Which gateway mutation failed; carried in scheduling errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    Schedule,
    Unschedule,
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GatewayOp::Schedule => "schedule",
            GatewayOp::Unschedule => "unschedule",
        };
        f.write_str(s)
    }
}

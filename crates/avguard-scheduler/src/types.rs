use std::fmt;

use serde::{Deserialize, Serialize};

/// The one job this subsystem manages.
pub const SCAN_JOB: JobId = JobId("avguard.scan-job");

/// Opaque, fixed identifier of a managed job.
///
/// Exactly one instance exists per deployment ([`SCAN_JOB`]); identifiers are
/// constants, never minted at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(&'static str);

impl JobId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The scheduler's record of whether a job is actively firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Actively scheduled and firing.
    Normal,
    /// Not scheduled at all.
    None,
    /// Any other host-specific state (paused, blocked, errored). Not a state
    /// this logic created, so it is never touched.
    Other,
}

impl TriggerState {
    /// Map a stored state string. Unrecognised strings land in `Other` so an
    /// operator-introduced state never gets clobbered.
    pub fn from_store(s: &str) -> Self {
        match s {
            "normal" => TriggerState::Normal,
            "none" => TriggerState::None,
            _ => TriggerState::Other,
        }
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerState::Normal => "normal",
            TriggerState::None => "none",
            TriggerState::Other => "other",
        };
        f.write_str(s)
    }
}

/// The two trigger points of the reconciliation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Fired once after the hosting component finishes initializing; repairs
    /// trigger state left over from an upgrade.
    PostInitRecheck,
    /// Fired when this application's own package is freshly installed.
    InstallEvent,
}

/// What the reconciler wants done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// Leave the trigger alone.
    None,
    /// Register the trigger.
    Schedule,
    /// Unschedule, then schedule, in that order.
    Reschedule,
}

/// Defines when the scan job runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Repeat every N seconds.
    Interval { every_secs: u64 },
    /// Fire at HH:MM UTC every day.
    Daily { hour: u8, minute: u8 },
}

/// A persisted scan-job record.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub schedule: Schedule,
    /// Trigger registration state, as the scheduler sees it.
    pub state: TriggerState,
    /// RFC 3339 timestamp of the most recent firing, if any.
    pub last_run: Option<String>,
    /// RFC 3339 timestamp of the next planned firing, if any.
    pub next_run: Option<String>,
    /// Total number of completed firings.
    pub run_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_strings_round_trip_for_known_states() {
        assert_eq!(TriggerState::from_store("normal"), TriggerState::Normal);
        assert_eq!(TriggerState::from_store("none"), TriggerState::None);
    }

    #[test]
    fn unknown_store_strings_map_to_other() {
        assert_eq!(TriggerState::from_store("paused"), TriggerState::Other);
        assert_eq!(TriggerState::from_store("blocked"), TriggerState::Other);
        assert_eq!(TriggerState::from_store(""), TriggerState::Other);
    }
}

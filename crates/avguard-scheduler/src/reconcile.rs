//! Pure scheduling decision logic.
//!
//! No I/O and no side effects; the full 2×3 input space is covered by the
//! tests below.

use crate::types::{EventKind, ReconcileDecision, TriggerState};

/// Decide the scheduling action for `event` given the job's current
/// trigger state.
pub fn decide(event: EventKind, state: TriggerState) -> ReconcileDecision {
    match (event, state) {
        // A job that survived an upgrade can appear scheduled yet never fire
        // again; force trigger re-registration to repair it.
        (EventKind::PostInitRecheck, TriggerState::Normal) => ReconcileDecision::Reschedule,

        // The recheck is not responsible for first-time scheduling.
        (EventKind::PostInitRecheck, TriggerState::None) => ReconcileDecision::None,

        // Already scheduled; installing must not duplicate or disturb the
        // running trigger.
        (EventKind::InstallEvent, TriggerState::Normal) => ReconcileDecision::None,

        // First-time install establishes the job.
        (EventKind::InstallEvent, TriggerState::None) => ReconcileDecision::Schedule,

        // Paused/blocked/errored states were not created by this logic;
        // leave them alone.
        (_, TriggerState::Other) => ReconcileDecision::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind::{InstallEvent, PostInitRecheck};
    use crate::types::ReconcileDecision::{None, Reschedule, Schedule};
    use crate::types::TriggerState;

    #[test]
    fn full_decision_table() {
        let table = [
            (PostInitRecheck, TriggerState::Normal, Reschedule),
            (PostInitRecheck, TriggerState::None, None),
            (PostInitRecheck, TriggerState::Other, None),
            (InstallEvent, TriggerState::Normal, None),
            (InstallEvent, TriggerState::None, Schedule),
            (InstallEvent, TriggerState::Other, None),
        ];

        for (event, state, expected) in table {
            assert_eq!(
                decide(event, state),
                expected,
                "decide({event:?}, {state:?})"
            );
        }
    }

    #[test]
    fn schedule_never_issued_when_already_normal() {
        // The single-active-trigger invariant: no event kind produces
        // Schedule while the trigger is already registered.
        for event in [PostInitRecheck, InstallEvent] {
            assert_ne!(decide(event, TriggerState::Normal), Schedule);
        }
    }
}

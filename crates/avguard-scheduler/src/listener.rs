//! Lifecycle listener that keeps the scan job scheduled.
//!
//! Two trigger points share one reconciliation sequence (read trigger state,
//! decide, apply): a post-init recheck run once while the component is being
//! constructed, and install events for this application's own package. The
//! recheck repairs a host defect where an upgraded job stays registered but
//! silently stops firing, by forcing trigger re-registration.

use std::sync::{Arc, Mutex};

use avguard_events::{LifecycleEvent, LifecycleListener, ListenerError};
use tracing::{debug, info};

use avguard_core::config::AVGUARD_PACKAGE_ID;

use crate::error::Result;
use crate::gateway::SchedulerGateway;
use crate::reconcile::decide;
use crate::types::{EventKind, JobId, ReconcileDecision, SCAN_JOB};

/// Name this listener registers under on the lifecycle bus.
pub const LISTENER_NAME: &str = "scan-job-scheduler";

/// Capability query: is a request/operation context currently available?
///
/// The post-init recheck must not run during early host boot, before such a
/// context exists; callers answer through this probe instead of the recheck
/// guessing from ambient state.
pub trait ContextProbe: Send + Sync {
    fn context_available(&self) -> bool;
}

/// Keeps [`SCAN_JOB`] correctly scheduled across installs and upgrades.
pub struct ScanJobSchedulerListener {
    gateway: Arc<dyn SchedulerGateway>,
    job: JobId,
    /// Serializes reconciliation sequences for the job; the two trigger
    /// points must never interleave gateway calls.
    seq: Mutex<()>,
}

impl ScanJobSchedulerListener {
    /// Construct the listener and run the post-init recheck.
    ///
    /// The recheck is skipped when `probe` reports no context (early boot).
    /// A recheck failure aborts construction — the hosting component must
    /// fail to initialize rather than run with unknown trigger state.
    pub fn initialize(
        gateway: Arc<dyn SchedulerGateway>,
        probe: &dyn ContextProbe,
    ) -> Result<Arc<Self>> {
        let listener = Arc::new(Self {
            gateway,
            job: SCAN_JOB,
            seq: Mutex::new(()),
        });

        if probe.context_available() {
            listener.reconcile(EventKind::PostInitRecheck)?;
        } else {
            debug!("no operation context yet; post-init recheck skipped");
        }

        Ok(listener)
    }

    /// Read trigger state, decide, apply. On `Reschedule` the unschedule
    /// strictly precedes the schedule; a failure at any step surfaces
    /// immediately with no compensating calls.
    fn reconcile(&self, event: EventKind) -> Result<()> {
        let _guard = self.seq.lock().expect("reconcile lock poisoned");

        let state = self.gateway.trigger_state(&self.job)?;
        let decision = decide(event, state);
        debug!(job_id = %self.job, ?event, %state, ?decision, "reconciling scan job");

        match decision {
            ReconcileDecision::None => {}
            ReconcileDecision::Schedule => {
                info!(job_id = %self.job, "registering scan job trigger");
                self.gateway.schedule(&self.job)?;
            }
            ReconcileDecision::Reschedule => {
                info!(job_id = %self.job, "re-registering scan job trigger");
                self.gateway.unschedule(&self.job)?;
                self.gateway.schedule(&self.job)?;
            }
        }
        Ok(())
    }
}

impl LifecycleListener for ScanJobSchedulerListener {
    fn on_event(&self, event: &LifecycleEvent) -> std::result::Result<(), ListenerError> {
        let LifecycleEvent::ComponentInstalled { package_id } = event;

        // Only this application's own package is of interest.
        if package_id != AVGUARD_PACKAGE_ID {
            return Ok(());
        }

        self.reconcile(EventKind::InstallEvent)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;
    use crate::gateway::GatewayOp;
    use crate::types::TriggerState;

    struct Ready;
    impl ContextProbe for Ready {
        fn context_available(&self) -> bool {
            true
        }
    }

    struct Booting;
    impl ContextProbe for Booting {
        fn context_available(&self) -> bool {
            false
        }
    }

    /// Recording gateway whose state tracks schedule/unschedule calls, so
    /// back-to-back sequences observe the state the previous one left.
    struct FakeGateway {
        state: Mutex<TriggerState>,
        calls: Mutex<Vec<&'static str>>,
        fail_schedule: bool,
        fail_unschedule: bool,
    }

    impl FakeGateway {
        fn with_state(state: TriggerState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(state),
                calls: Mutex::new(Vec::new()),
                fail_schedule: false,
                fail_unschedule: false,
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SchedulerGateway for FakeGateway {
        fn trigger_state(&self, _job: &JobId) -> Result<TriggerState> {
            Ok(*self.state.lock().unwrap())
        }

        fn schedule(&self, job: &JobId) -> Result<()> {
            self.calls.lock().unwrap().push("schedule");
            if self.fail_schedule {
                return Err(SchedulerError::scheduling(
                    GatewayOp::Schedule,
                    job,
                    SchedulerError::JobNotFound {
                        id: job.as_str().to_string(),
                    },
                ));
            }
            *self.state.lock().unwrap() = TriggerState::Normal;
            Ok(())
        }

        fn unschedule(&self, job: &JobId) -> Result<()> {
            self.calls.lock().unwrap().push("unschedule");
            if self.fail_unschedule {
                return Err(SchedulerError::scheduling(
                    GatewayOp::Unschedule,
                    job,
                    SchedulerError::JobNotFound {
                        id: job.as_str().to_string(),
                    },
                ));
            }
            *self.state.lock().unwrap() = TriggerState::None;
            Ok(())
        }
    }

    fn own_install() -> LifecycleEvent {
        LifecycleEvent::ComponentInstalled {
            package_id: AVGUARD_PACKAGE_ID.to_string(),
        }
    }

    fn listener(gateway: Arc<FakeGateway>) -> Arc<ScanJobSchedulerListener> {
        // Construct without running the recheck so tests control every call.
        ScanJobSchedulerListener::initialize(gateway, &Booting).unwrap()
    }

    #[test]
    fn fresh_install_schedules_exactly_once() {
        let gw = FakeGateway::with_state(TriggerState::None);
        let l = listener(gw.clone());

        l.on_event(&own_install()).unwrap();

        assert_eq!(gw.calls(), vec!["schedule"]);
    }

    #[test]
    fn install_is_idempotent() {
        let gw = FakeGateway::with_state(TriggerState::None);
        let l = listener(gw.clone());

        // After the first sequence the state is Normal; the second must be
        // a no-op, never a second active trigger.
        l.on_event(&own_install()).unwrap();
        l.on_event(&own_install()).unwrap();

        assert_eq!(gw.calls(), vec!["schedule"]);
    }

    #[test]
    fn install_leaves_running_trigger_alone() {
        let gw = FakeGateway::with_state(TriggerState::Normal);
        let l = listener(gw.clone());

        l.on_event(&own_install()).unwrap();

        assert!(gw.calls().is_empty());
    }

    #[test]
    fn foreign_package_triggers_no_gateway_calls() {
        let gw = FakeGateway::with_state(TriggerState::None);
        let l = listener(gw.clone());

        l.on_event(&LifecycleEvent::ComponentInstalled {
            package_id: "org.example:unrelated".to_string(),
        })
        .unwrap();

        assert!(gw.calls().is_empty());
    }

    #[test]
    fn post_init_recheck_reschedules_in_order() {
        let gw = FakeGateway::with_state(TriggerState::Normal);

        ScanJobSchedulerListener::initialize(gw.clone(), &Ready).unwrap();

        // Unschedule strictly before schedule, nothing interleaved.
        assert_eq!(gw.calls(), vec!["unschedule", "schedule"]);
    }

    #[test]
    fn recheck_does_not_do_first_time_scheduling() {
        let gw = FakeGateway::with_state(TriggerState::None);

        ScanJobSchedulerListener::initialize(gw.clone(), &Ready).unwrap();

        assert!(gw.calls().is_empty());
    }

    #[test]
    fn ambiguous_state_is_never_touched() {
        let gw = FakeGateway::with_state(TriggerState::Other);
        let l = ScanJobSchedulerListener::initialize(gw.clone(), &Ready).unwrap();

        l.on_event(&own_install()).unwrap();

        assert!(gw.calls().is_empty());
    }

    #[test]
    fn recheck_skipped_without_context() {
        let gw = FakeGateway::with_state(TriggerState::Normal);

        ScanJobSchedulerListener::initialize(gw.clone(), &Booting).unwrap();

        assert!(gw.calls().is_empty());
    }

    #[test]
    fn schedule_failure_surfaces_without_compensation() {
        let gw = Arc::new(FakeGateway {
            state: Mutex::new(TriggerState::None),
            calls: Mutex::new(Vec::new()),
            fail_schedule: true,
            fail_unschedule: false,
        });
        let l = listener(gw.clone());

        let err = l.on_event(&own_install()).unwrap_err();
        assert!(err.to_string().contains("schedule failed"));

        // No follow-up unschedule after the failed schedule.
        assert_eq!(gw.calls(), vec!["schedule"]);
    }

    #[test]
    fn reschedule_aborts_when_unschedule_fails() {
        let gw = Arc::new(FakeGateway {
            state: Mutex::new(TriggerState::Normal),
            calls: Mutex::new(Vec::new()),
            fail_schedule: false,
            fail_unschedule: true,
        });

        // A failing recheck aborts initialization.
        let result = ScanJobSchedulerListener::initialize(gw.clone(), &Ready);
        assert!(result.is_err());

        // The schedule step never ran.
        assert_eq!(gw.calls(), vec!["unschedule"]);
    }

    #[test]
    fn reschedule_failure_during_schedule_leaves_job_unscheduled() {
        let gw = Arc::new(FakeGateway {
            state: Mutex::new(TriggerState::Normal),
            calls: Mutex::new(Vec::new()),
            fail_schedule: true,
            fail_unschedule: false,
        });

        let result = ScanJobSchedulerListener::initialize(gw.clone(), &Ready);
        assert!(result.is_err());

        // Surfaced, not compensated: the job stays unscheduled until the
        // next recheck or operator action.
        assert_eq!(gw.calls(), vec!["unschedule", "schedule"]);
        assert_eq!(*gw.state.lock().unwrap(), TriggerState::None);
    }
}

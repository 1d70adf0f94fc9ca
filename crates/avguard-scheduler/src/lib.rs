//! `avguard-scheduler` — keeps the recurring scan job correctly scheduled.
//!
//! # Overview
//!
//! A single recurring background job (the scan job) must stay scheduled
//! across install and upgrade events of the application package. The
//! [`reconcile::decide`] function maps an event kind and the job's current
//! trigger state to the scheduling action to apply through a
//! [`gateway::SchedulerGateway`]:
//!
//! | Event           | Trigger state | Action                  |
//! |-----------------|---------------|-------------------------|
//! | post-init check | normal        | unschedule + schedule   |
//! | post-init check | none          | nothing                 |
//! | post-init check | other         | nothing                 |
//! | install         | normal        | nothing                 |
//! | install         | none          | schedule                |
//! | install         | other         | nothing                 |
//!
//! The decision logic is pure; all effects run through the gateway. The
//! [`listener::ScanJobSchedulerListener`] drives it from two trigger points:
//! once at component initialization (repairing state left by an upgrade) and
//! on every install event for this application's own package.
//!
//! The crate also ships the host side: a SQLite job store behind
//! [`store::SqliteGateway`] and the [`engine::ScanJobEngine`] tick loop that
//! fires the job when its `next_run` arrives.

pub mod db;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod reconcile;
pub mod schedule;
pub mod store;
pub mod types;

pub use engine::{FiredScan, ScanJobEngine};
pub use error::{Result, SchedulerError};
pub use gateway::{GatewayOp, SchedulerGateway};
pub use listener::{ContextProbe, ScanJobSchedulerListener};
pub use reconcile::decide;
pub use store::SqliteGateway;
pub use types::{EventKind, JobId, ReconcileDecision, ScanJob, Schedule, TriggerState, SCAN_JOB};

//! `avguard-events` — lifecycle event vocabulary and in-process dispatch.
//!
//! The host application delivers component lifecycle notifications through
//! the [`bus::LifecycleBus`]. Subsystems register a [`types::LifecycleListener`]
//! and react to the events they care about; a listener failure is logged and
//! never propagated to the emitter.

pub mod bus;
pub mod error;
pub mod types;

pub use bus::LifecycleBus;
pub use error::{EventError, Result};
pub use types::{LifecycleEvent, LifecycleListener, ListenerError};

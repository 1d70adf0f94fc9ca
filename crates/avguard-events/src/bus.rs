use std::sync::{Arc, RwLock};

use tracing::{debug, error};

use crate::error::{EventError, Result};
use crate::types::{LifecycleEvent, LifecycleListener};

struct Registration {
    /// Unique name used for deregistration and log correlation.
    name: String,
    listener: Arc<dyn LifecycleListener>,
}

/// Central registry and dispatcher for lifecycle listeners.
///
/// Designed to be shared across the whole process as `Arc<LifecycleBus>`.
/// Dispatch order is registration order.
pub struct LifecycleBus {
    listeners: RwLock<Vec<Registration>>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener under a unique name.
    pub fn register(
        &self,
        name: impl Into<String>,
        listener: Arc<dyn LifecycleListener>,
    ) -> Result<()> {
        let name = name.into();
        let mut listeners = self.listeners.write().expect("listener registry poisoned");
        if listeners.iter().any(|r| r.name == name) {
            return Err(EventError::DuplicateName(name));
        }
        listeners.push(Registration {
            name: name.clone(),
            listener,
        });
        debug!(%name, "lifecycle listener registered");
        Ok(())
    }

    /// Remove a listener by name. Silent no-op if the name is not found.
    pub fn unregister(&self, name: &str) {
        let mut listeners = self.listeners.write().expect("listener registry poisoned");
        let before = listeners.len();
        listeners.retain(|r| r.name != name);
        if listeners.len() < before {
            debug!(name, "lifecycle listener unregistered");
        }
    }

    /// Deliver `event` to every registered listener in order.
    ///
    /// Listener errors are logged and swallowed: an install event that one
    /// subsystem fails to handle must not stop delivery to the others or
    /// crash the host process.
    pub fn emit(&self, event: &LifecycleEvent) {
        let listeners = self.listeners.read().expect("listener registry poisoned");

        for reg in listeners.iter() {
            match reg.listener.on_event(event) {
                Ok(()) => {
                    debug!(listener = %reg.name, event = event.kind(), "listener handled event");
                }
                Err(source) => {
                    let err = EventError::Listener {
                        listener: reg.name.clone(),
                        message: source.to_string(),
                    };
                    error!(event = event.kind(), "{err}");
                }
            }
        }
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListenerError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl LifecycleListener for Counting {
        fn on_event(&self, _event: &LifecycleEvent) -> std::result::Result<(), ListenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl LifecycleListener for Failing {
        fn on_event(&self, _event: &LifecycleEvent) -> std::result::Result<(), ListenerError> {
            Err("boom".into())
        }
    }

    fn install_event() -> LifecycleEvent {
        LifecycleEvent::ComponentInstalled {
            package_id: "com.example:thing".to_string(),
        }
    }

    #[test]
    fn emit_reaches_all_listeners() {
        let bus = LifecycleBus::new();
        let a = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let b = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        bus.register("a", a.clone()).unwrap();
        bus.register("b", b.clone()).unwrap();

        bus.emit(&install_event());

        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_listener_does_not_stop_dispatch() {
        let bus = LifecycleBus::new();
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        bus.register("failing", Arc::new(Failing)).unwrap();
        bus.register("counting", counting.clone()).unwrap();

        bus.emit(&install_event());

        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let bus = LifecycleBus::new();
        bus.register("dup", Arc::new(Failing)).unwrap();
        let err = bus.register("dup", Arc::new(Failing)).unwrap_err();
        assert!(matches!(err, EventError::DuplicateName(ref n) if n == "dup"));
    }

    #[test]
    fn unregister_removes_by_name() {
        let bus = LifecycleBus::new();
        let counting = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        bus.register("counting", counting.clone()).unwrap();
        bus.unregister("counting");

        bus.emit(&install_event());

        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }
}

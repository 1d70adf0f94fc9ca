use serde::{Deserialize, Serialize};

/// Component lifecycle notifications delivered by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LifecycleEvent {
    /// A component package finished installing.
    ///
    /// `package_id` is the installed package's identifier; listeners are
    /// expected to filter on it rather than react to every install.
    ComponentInstalled { package_id: String },
}

impl LifecycleEvent {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::ComponentInstalled { .. } => "component_installed",
        }
    }
}

/// Opaque error a listener may surface from [`LifecycleListener::on_event`].
///
/// The bus logs these and keeps dispatching; a failing listener never takes
/// down the emitter or the other listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Synchronous lifecycle event handler.
///
/// Handlers run on the emitter's thread and must not block for long; the bus
/// holds its registry read lock for the duration of a dispatch.
pub trait LifecycleListener: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent) -> Result<(), ListenerError>;
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    /// A registered listener returned an error while handling an event.
    #[error("Listener '{listener}' failed: {message}")]
    Listener { listener: String, message: String },

    /// A listener was registered under a name that is already taken.
    #[error("Duplicate listener name: {0}")]
    DuplicateName(String),
}

pub type Result<T> = std::result::Result<T, EventError>;

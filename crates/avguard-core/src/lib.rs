//! `avguard-core` — shared configuration and error types.

pub mod config;
pub mod error;

pub use config::AvguardConfig;
pub use error::{AvguardError, Result};

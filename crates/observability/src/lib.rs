//! Process-wide logging setup.

/// Log subscriber configuration.
pub mod tracing;

pub use self::tracing::{LOG_FORMAT_VAR, LogFormat, init, init_with};

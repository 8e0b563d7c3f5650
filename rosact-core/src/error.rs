//! Error types shared by the rosact crates.

use thiserror::Error;

/// Dynamic error type that can be sent and shared between threads.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in transport-independent actionlib code.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A wire-level goal status value outside the known enumeration.
    #[error("unknown goal status value: {0}")]
    UnknownStatusValue(u8),
}

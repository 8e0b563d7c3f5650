//! Error types for the rosact client.
//!
//! Only transport and setup failures surface as `Err`; protocol anomalies
//! and API misuse are logged and absorbed (see the crate documentation).

use rosact_core::{CoreError, DynError};
use thiserror::Error;

/// Result type for rosact operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the rosact client.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-independent actionlib error.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Failure reported by the topic transport.
    #[error("transport error: {0}")]
    Transport(DynError),

    /// A transport channel was closed while still in use.
    #[error("channel closed")]
    ChannelClosed,
}

//! Logging setup using tracing.
//!
//! The client itself only emits `tracing` events; this module is a
//! convenience for binaries and tests that want those events on stderr.
//! It also captures `log` crate calls and forwards them to tracing.
//!
//! # Example
//!
//! ```ignore
//! use rosact::logger::init_logging;
//! use tracing::{info, warn};
//!
//! // Initialize logging (call once at startup)
//! init_logging();
//!
//! info!("client started");
//! warn!("server not up yet");
//! ```

use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize stderr logging with tracing integration.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call more than once,
/// subsequent calls are ignored.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        // Set up log -> tracing bridge
        tracing_log::LogTracer::init().ok();

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::NONE)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    });
}

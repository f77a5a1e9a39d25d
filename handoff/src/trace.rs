//! Tracing infrastructure for the hand-off runtime.
//!
//! Enabled by the default `tracing` feature. All log macros become no-ops
//! when the feature is disabled.
//!
//! These log events are separate from the diagnostic stream written through
//! [`crate::report::Report`]: the stream is program output, the logs are for
//! whoever is debugging the lock protocol.

/// Initialize the tracing subscriber with timestamps.
///
/// Filter defaults to `handoff=info` and can be overridden with `RUST_LOG`.
/// Calling it more than once is harmless; only the first call installs a
/// subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("handoff=info"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, error, info, trace, warn};

// Without the feature every log macro expands to nothing, arguments included.
#[cfg(not(feature = "tracing"))]
macro_rules! noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {noop as debug, noop as error, noop as info, noop as trace, noop as warn};

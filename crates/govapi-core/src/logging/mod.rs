//! Structured logging with `tracing`.
//!
//! [`init_subscriber`] installs the process-wide subscriber: an `EnvFilter`
//! (`RUST_LOG` wins over the configured level) feeding a stderr `fmt` layer,
//! compact or JSON. [`capture_logs`] installs a thread-local capturing
//! subscriber for tests that assert on emitted events.

pub mod capture;

pub use capture::{CapturedEvent, CapturedLogs, capture_logs};

/// Output format for the stderr log layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at startup. Subsequent calls are no-ops.
///
/// # Arguments
///
/// * `level` - Default filter directive, e.g. `"info"` or `"govapi=debug"`.
/// * `format` - Compact text or JSON lines.
pub fn init_subscriber(level: &str, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    // try_init is a no-op if a global subscriber is already set
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

//! # Telemetry Initialization
//!
//! Structured logging setup shared by every binary embedding the
//! pipeline. Filtering follows `RUST_LOG`.

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

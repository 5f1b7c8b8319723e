//! Logging initialization and configuration.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info,vkengine=debug,vkengine_renderer=debug,vkengine_rhi=info";

/// Initialize the logging system with tracing.
///
/// This sets up tracing-subscriber with:
/// - Environment-based filtering (RUST_LOG), falling back to a debug-level
///   filter for the engine's own crates
/// - Target and thread id on every line
///
/// Calling this twice is harmless; the second registration is ignored.
///
/// # Example
/// ```
/// vkengine_core::init_logging();
/// tracing::info!("Engine initialized");
/// ```
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}

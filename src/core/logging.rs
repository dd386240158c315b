//! Logging initialization

use env_logger::{Builder, Env};

fn builder() -> Builder {
    Builder::from_env(Env::default().default_filter_or("info"))
}

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// buildgen::core::logging::init();
/// log::info!("Generating buildings");
/// ```
pub fn init() {
    let _ = builder().try_init();
}

/// Same as [`init`] with millisecond timestamps, for command line tools
pub fn init_with_timestamps() {
    let _ = builder().format_timestamp_millis().try_init();
}

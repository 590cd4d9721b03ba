//! Process-wide tracing setup shared by the binaries.

pub mod tracing;

pub use tracing::{LogFormat, LogOptions};

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(options: &LogOptions) {
    tracing::init(options);
}

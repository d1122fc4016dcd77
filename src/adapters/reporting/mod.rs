//! Error reporter adapters.

mod cloud_logging;
mod in_memory;

pub use cloud_logging::CloudLoggingReporter;
pub use in_memory::InMemoryErrorReporter;

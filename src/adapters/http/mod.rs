//! HTTP adapters - the trigger delivery surface.

pub mod triggers;

pub use triggers::{trigger_router, TriggerAppState};

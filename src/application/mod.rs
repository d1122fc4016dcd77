//! Application layer - trigger handlers and their dispatch.
//!
//! Handlers orchestrate domain rules and ports. They are invoked by the
//! [`TriggerDispatcher`], which the HTTP surface feeds with decoded events.

pub mod batch;
pub mod dispatcher;
pub mod error;
pub mod failure;
pub mod handlers;
pub mod services;

pub use dispatcher::{RouteInfo, TriggerDispatcher};
pub use error::{HandlerError, GENERIC_ERROR_MESSAGE};
pub use failure::{FailureContext, FailureRecorder};
pub use services::{Services, TriggerSettings};

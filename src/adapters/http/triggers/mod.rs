//! HTTP adapter for trigger deliveries.
//!
//! The hosting platform posts one event per request:
//! - `POST /triggers/document` - Document store changes
//! - `POST /triggers/auth` - Identity lifecycle
//! - `POST /triggers/analytics` - Analytics conversions

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod signature;

pub use dto::{DocumentEventRequest, ErrorResponse, HandledResponse};
pub use handlers::{TriggerApiError, TriggerAppState};
pub use routes::trigger_router;
pub use signature::{SignatureError, SignatureHeader, TriggerSignatureVerifier, SIGNATURE_HEADER};

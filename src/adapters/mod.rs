//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `firestore` - Document store over the Firestore REST API
//! - `store` - In-memory document store for tests
//! - `stripe` - Payment provider (Stripe) and its mock
//! - `email` - SMTP mailer (lettre) and an in-memory recorder
//! - `push` - FCM push notifier and an in-memory recorder
//! - `reporting` - Cloud Logging error reporter and an in-memory recorder
//! - `gcp` - Access tokens for Google APIs
//! - `http` - Trigger delivery endpoints (axum)

pub mod email;
pub mod firestore;
pub mod gcp;
pub mod http;
pub mod push;
pub mod reporting;
pub mod store;
pub mod stripe;

pub use email::{InMemoryMailer, SmtpMailer};
pub use firestore::FirestoreDocumentStore;
pub use gcp::GcpTokenSource;
pub use http::{trigger_router, TriggerAppState};
pub use push::{FcmNotifier, InMemoryPushNotifier};
pub use reporting::{CloudLoggingReporter, InMemoryErrorReporter};
pub use store::InMemoryDocumentStore;
pub use stripe::{MockPaymentProvider, StripeConfig, StripePaymentAdapter};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the trigger handlers and the outside world. Adapters implement them.
//!
//! - `DocumentStore` - The watched document database
//! - `PaymentProvider` - Hosted payment API
//! - `Mailer` - Outbound email
//! - `PushNotifier` - Device push notifications
//! - `ErrorReporter` - Central error log sink

mod document_store;
mod error_reporter;
mod mailer;
mod payment_provider;
mod push_notifier;

pub use document_store::{DocumentStore, Page, PageRequest, StoreError, StoredDocument};
pub use error_reporter::{ErrorReport, ErrorReporter, ReportError};
pub use mailer::{MailError, Mailer};
pub use payment_provider::{
    Address, BirthDate, BusinessProfile, CardDetails, ConnectedAccount, CreateConnectedAccountRequest,
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, ExternalAccount, Individual,
    PaymentError, PaymentIntent, PaymentMethod, PaymentProvider, SetupIntent, TosAcceptance,
    TransferData,
};
pub use push_notifier::{PushError, PushNotifier};

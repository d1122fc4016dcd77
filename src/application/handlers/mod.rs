//! Trigger handlers.
//!
//! Each handler is one function of the deployed service. Handlers hold the
//! client handles they need, run a short linear sequence of awaited calls
//! and never return an error: failures are recorded on the owning document
//! and reported through the [`FailureRecorder`](super::FailureRecorder).

mod connected_account;
mod customer;
mod notification;
mod payment;
mod payment_method;

use async_trait::async_trait;

use crate::domain::foundation::PathParams;
use crate::domain::trigger::DocumentEvent;

pub use connected_account::{account_request, AttachExternalAccount, CreateConnectedAccount};
pub use customer::{CleanupUser, CreateCustomer};
pub use notification::{NotifyAppLifecycle, NotifyLead};
pub use payment::{CreatePaymentIntent, HandlePaymentUpdate};
pub use payment_method::{AttachPaymentMethod, DetachPaymentMethod, UpdatePaymentMethod};

/// Handler bound to a document path pattern.
#[async_trait]
pub trait DocumentTrigger: Send + Sync {
    /// Function name used in logs, error reports and HTTP responses.
    fn name(&self) -> &'static str;

    /// Handle one event. `params` holds the captured path segments.
    async fn handle(&self, event: DocumentEvent, params: PathParams);
}

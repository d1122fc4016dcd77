//! Saved cards: attach on create, sync expiry and default on update,
//! detach on delete.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::customer::read_profile;
use super::DocumentTrigger;
use crate::application::error::HandlerError;
use crate::application::failure::{FailureContext, FailureRecorder};
use crate::domain::customer::customer_path;
use crate::domain::foundation::{field, PathParams};
use crate::domain::payment_method::{
    became_primary, expiry_change, CardDisplay, PaymentMethodDocument,
};
use crate::domain::trigger::DocumentEvent;
use crate::ports::{DocumentStore, PaymentError, PaymentProvider};

const USER_ID: &str = "userId";

/// Attaches a newly saved card to the user's payment customer.
pub struct AttachPaymentMethod {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    failures: FailureRecorder,
}

impl AttachPaymentMethod {
    pub const NAME: &'static str = "attach_payment_method";

    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            store,
            payments,
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent, params: &PathParams) -> Result<(), HandlerError> {
        let uid = params.require(USER_ID)?;
        let method = PaymentMethodDocument::from_document(&event.current())?;
        let method_id = method.provider_id(event.path.id());
        let profile = read_profile(self.store.as_ref(), uid).await?;
        let customer_id = profile.require_customer_id()?;

        // 1. Attach, then read back the card for display
        self.payments
            .attach_payment_method(method_id, customer_id)
            .await?;
        let card = self
            .payments
            .retrieve_payment_method(method_id)
            .await?
            .card
            .ok_or_else(|| {
                PaymentError::Unexpected(format!("payment method {} has no card", method_id))
            })?;
        let display = CardDisplay {
            brand: card.brand,
            last4: card.last4,
            month: card.exp_month,
            year: card.exp_year,
            primary: true,
        };
        self.store
            .merge(&event.path, display.to_document()?)
            .await?;

        // 2. Fresh setup intent for the next card
        let intent = self.payments.create_setup_intent(customer_id).await?;
        let mut fields = field("setup_secret", json!(intent.client_secret));
        fields.insert("default_payment_method".to_string(), json!(method_id));
        self.store.merge(&customer_path(uid), fields).await?;

        tracing::info!(user = uid, payment_method = method_id, "Payment method attached");
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for AttachPaymentMethod {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent, params: PathParams) {
        if let Err(error) = self.run(&event, &params).await {
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        user: params.get(USER_ID),
                        annotate: Some(&event.path),
                        document: Some(&event.path),
                        annotate_existing: false,
                    },
                )
                .await;
        }
    }
}

/// Pushes expiry edits to the provider and promotes cards marked primary.
pub struct UpdatePaymentMethod {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    failures: FailureRecorder,
}

impl UpdatePaymentMethod {
    pub const NAME: &'static str = "update_payment_method";

    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            store,
            payments,
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent, params: &PathParams) -> Result<(), HandlerError> {
        let uid = params.require(USER_ID)?;
        let before = event.before_or_empty();
        let after = event.current();
        let method = PaymentMethodDocument::from_document(&after)?;
        let method_id = method.provider_id(event.path.id());

        if let Some(expiry) = expiry_change(&before, &after)? {
            self.payments
                .update_payment_method_expiry(method_id, expiry)
                .await?;
            tracing::info!(
                user = uid,
                payment_method = method_id,
                month = expiry.month,
                year = expiry.year,
                "Card expiry updated"
            );
        }

        if became_primary(&before, &after)? {
            let profile = read_profile(self.store.as_ref(), uid).await?;
            let customer_id = profile.require_customer_id()?;
            self.payments
                .set_default_payment_method(customer_id, method_id)
                .await?;
            self.store
                .merge(
                    &customer_path(uid),
                    field("default_payment_method", json!(method_id)),
                )
                .await?;
            tracing::info!(user = uid, payment_method = method_id, "Default payment method set");
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for UpdatePaymentMethod {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent, params: PathParams) {
        if let Err(error) = self.run(&event, &params).await {
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        user: params.get(USER_ID),
                        annotate: Some(&event.path),
                        document: Some(&event.path),
                        annotate_existing: false,
                    },
                )
                .await;
        }
    }
}

/// Detaches a deleted card at the provider.
pub struct DetachPaymentMethod {
    payments: Arc<dyn PaymentProvider>,
    failures: FailureRecorder,
}

impl DetachPaymentMethod {
    pub const NAME: &'static str = "detach_payment_method";

    pub fn new(payments: Arc<dyn PaymentProvider>, failures: FailureRecorder) -> Self {
        Self { payments, failures }
    }

    async fn run(&self, event: &DocumentEvent) -> Result<(), HandlerError> {
        let method = PaymentMethodDocument::from_document(&event.before_or_empty())?;
        let method_id = method.provider_id(event.path.id());
        self.payments.detach_payment_method(method_id).await?;
        tracing::info!(payment_method = method_id, "Payment method detached");
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for DetachPaymentMethod {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent, params: PathParams) {
        let Err(error) = self.run(&event).await else {
            return;
        };
        // The card document is gone; the error goes onto the customer,
        // unless the whole user is being removed.
        let owner = event.path.parent();
        self.failures
            .record(
                Self::NAME,
                &error,
                FailureContext {
                    user: params.get(USER_ID),
                    annotate: owner.as_ref(),
                    document: Some(&event.path),
                    annotate_existing: true,
                },
            )
            .await;
    }
}

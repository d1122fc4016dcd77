//! Charges: payment intent creation, confirmation and order archiving.
//!
//! The payment document id is the provider idempotency key, so a
//! redelivered create event returns the intent created the first time
//! instead of charging again. That replay is the original response, so it
//! is never merged over a document that already carries an intent.
//!
//! Updates are driven by the `status` the provider response wrote onto the
//! document:
//!
//! ```text
//! created -> requires_confirmation -> succeeded
//!         -> succeeded
//!         -> error
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::customer::read_profile;
use super::DocumentTrigger;
use crate::application::batch::{
    copy_collection, delete_collection, COPY_BATCH_SIZE, DELETE_BATCH_SIZE,
};
use crate::application::error::HandlerError;
use crate::application::failure::{FailureContext, FailureRecorder};
use crate::domain::customer::{customer_path, ORDERS, ORDER_HISTORY, ORDER_ITEMS};
use crate::domain::foundation::{
    field, new_document_id, str_field, Document, DocumentPath, PathParams,
};
use crate::domain::notification::receipt_email;
use crate::domain::payment::{status_transition, PaymentDocument, SettledPayment, StatusTransition};
use crate::domain::trigger::DocumentEvent;
use crate::ports::{
    CreatePaymentIntentRequest, DocumentStore, Mailer, PaymentProvider, TransferData,
};

const USER_ID: &str = "userId";

/// Creates a payment intent for a new payment document.
pub struct CreatePaymentIntent {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    default_destination: Option<String>,
    failures: FailureRecorder,
}

impl CreatePaymentIntent {
    pub const NAME: &'static str = "create_payment_intent";

    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        default_destination: Option<String>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            store,
            payments,
            default_destination,
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent, params: &PathParams) -> Result<(), HandlerError> {
        let uid = params.require(USER_ID)?;
        let payment_id = event.path.id();

        // 1. Validate the charge request
        let charge = PaymentDocument::from_document(&event.current())?.charge_request()?;

        // 2. Customer and receipt address
        let profile = read_profile(self.store.as_ref(), uid).await?;
        let customer_id = profile.require_customer_id()?;

        // 3. Split to the merchant when both the amount and the account are known
        let destination = charge
            .destination
            .clone()
            .or_else(|| self.default_destination.clone());
        let transfer = match (charge.transfer_amount, destination) {
            (Some(amount), Some(destination)) => Some(TransferData {
                amount,
                destination,
            }),
            _ => None,
        };

        // 4. Create and confirm in one call, keyed by the document id
        let intent = self
            .payments
            .create_payment_intent(CreatePaymentIntentRequest {
                amount: charge.amount,
                currency: charge.currency,
                customer_id: customer_id.to_string(),
                card_token: charge.card_token,
                receipt_email: profile.email_address.clone(),
                transfer,
                confirm: true,
                off_session: false,
                idempotency_key: payment_id.to_string(),
            })
            .await?;

        // 5. Mirror the provider response once
        let stored = self.store.get(&event.path).await?.unwrap_or_default();
        if let Some(mirrored) = str_field(&stored, "id") {
            tracing::debug!(
                payment = payment_id,
                intent_id = mirrored,
                "Payment intent already mirrored, replay ignored"
            );
            return Ok(());
        }
        self.store
            .merge(&event.path, intent.to_document()?)
            .await?;

        tracing::info!(
            user = uid,
            payment = payment_id,
            intent_id = %intent.id,
            status = %intent.status,
            amount = intent.amount,
            "Payment intent created"
        );
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for CreatePaymentIntent {
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

/// Reacts to status changes on a payment document: confirms intents that
/// need it and archives the order once the charge succeeds.
pub struct HandlePaymentUpdate {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    mailer: Arc<dyn Mailer>,
    from_email: String,
    failures: FailureRecorder,
}

impl HandlePaymentUpdate {
    pub const NAME: &'static str = "handle_payment_update";

    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        mailer: Arc<dyn Mailer>,
        from_email: impl Into<String>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            store,
            payments,
            mailer,
            from_email: from_email.into(),
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent, params: &PathParams) -> Result<(), HandlerError> {
        let uid = params.require(USER_ID)?;
        let after = event.current();

        match status_transition(&event.before_or_empty(), &after)? {
            StatusTransition::NeedsConfirmation { intent_id } => {
                let intent = self.payments.confirm_payment_intent(&intent_id).await?;
                self.store
                    .merge(&event.path, intent.to_document()?)
                    .await?;
                tracing::info!(user = uid, intent_id = %intent_id, status = %intent.status, "Payment intent confirmed");
            }
            StatusTransition::Succeeded { intent_id } => {
                tracing::info!(user = uid, intent_id = %intent_id, "Payment succeeded");
                self.archive_order(uid, &event.path, &after).await?;
            }
            StatusTransition::None => {
                tracing::debug!(payment = %event.path, "Payment update needs no action");
            }
        }
        Ok(())
    }

    /// Move the pending order into history, open a new one and send the
    /// receipt.
    async fn archive_order(
        &self,
        uid: &str,
        payment_path: &DocumentPath,
        payment: &Document,
    ) -> Result<(), HandlerError> {
        let settled = SettledPayment::from_document(payment)?;
        let profile = read_profile(self.store.as_ref(), uid).await?;
        let order_id = profile.require_order_id()?;
        let customer = customer_path(uid);
        let pending = customer.child(ORDERS, order_id);
        let history = customer.child(ORDER_HISTORY, order_id);

        // 1. Copy the order and its items
        let mut archived = self.store.get(&pending).await?.unwrap_or_default();
        archived.insert("payment_id".to_string(), json!(payment_path.id()));
        archived.insert("archived_at".to_string(), json!(Utc::now().to_rfc3339()));
        self.store.set(&history, archived).await?;
        let items = copy_collection(
            self.store.as_ref(),
            &pending.subcollection(ORDER_ITEMS),
            &history.subcollection(ORDER_ITEMS),
            COPY_BATCH_SIZE,
        )
        .await?;

        // 2. Remove the pending order
        delete_collection(
            self.store.as_ref(),
            &pending.subcollection(ORDER_ITEMS),
            DELETE_BATCH_SIZE,
        )
        .await?;
        self.store.delete(&pending).await?;

        // 3. Fresh placeholder for the next order
        self.store
            .merge(&customer, field("order_id", json!(new_document_id())))
            .await?;
        tracing::info!(user = uid, order_id, items, "Order archived");

        // 4. Receipt
        match profile.email_address.as_deref() {
            Some(to) => {
                self.mailer
                    .send(receipt_email(
                        &self.from_email,
                        to,
                        &settled.id,
                        settled.amount,
                        &settled.currency,
                    ))
                    .await?;
            }
            None => tracing::warn!(user = uid, "No email address on file, receipt skipped"),
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for HandlePaymentUpdate {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::email::InMemoryMailer;
    use crate::adapters::reporting::InMemoryErrorReporter;
    use crate::adapters::store::InMemoryDocumentStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::PathPattern;
    use crate::ports::{MailError, PaymentError};
    use serde_json::Value;

    const PATTERN: &str = "customers/{userId}/payments/{pushId}";

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn payment_path(id: &str) -> DocumentPath {
        DocumentPath::parse(&format!("customers/u1/payments/{}", id)).unwrap()
    }

    fn params(path: &DocumentPath) -> PathParams {
        PathPattern::new(PATTERN).matches(path).unwrap()
    }

    fn request() -> Document {
        doc(json!({
            "subtotal": 10.00,
            "total": 12.00,
            "currency": "usd",
            "payment_method": "tok_1"
        }))
    }

    struct Fixture {
        store: Arc<InMemoryDocumentStore>,
        payments: MockPaymentProvider,
        mailer: Arc<InMemoryMailer>,
        reporter: Arc<InMemoryErrorReporter>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryDocumentStore::new());
            store.insert(
                &customer_path("u1"),
                doc(json!({"customer_id": "cus_1", "email_address": "a@x.com", "order_id": "o1"})),
            );
            Self {
                store,
                payments: MockPaymentProvider::new(),
                mailer: Arc::new(InMemoryMailer::new()),
                reporter: Arc::new(InMemoryErrorReporter::new()),
            }
        }

        fn failures(&self) -> FailureRecorder {
            FailureRecorder::new(self.store.clone(), self.reporter.clone())
        }

        fn create(&self, destination: Option<&str>) -> CreatePaymentIntent {
            CreatePaymentIntent::new(
                self.store.clone(),
                Arc::new(self.payments.clone()),
                destination.map(str::to_string),
                self.failures(),
            )
        }

        fn update(&self) -> HandlePaymentUpdate {
            HandlePaymentUpdate::new(
                self.store.clone(),
                Arc::new(self.payments.clone()),
                self.mailer.clone(),
                "Lidora <noreply@lidora.app>",
                self.failures(),
            )
        }
    }

    #[tokio::test]
    async fn creates_intent_with_split_and_mirrors_it() {
        let fx = Fixture::new();
        let path = payment_path("p1");
        fx.store.insert(&path, request());

        fx.create(Some("acct_default"))
            .handle(DocumentEvent::created(path.clone(), request()), params(&path))
            .await;

        let intents = fx.payments.intents();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].amount, 1200);
        assert_eq!(
            intents[0].transfer_data,
            Some(TransferData {
                amount: 1000,
                destination: "acct_default".into()
            })
        );
        let mirrored = fx.store.document(&path).unwrap();
        assert_eq!(mirrored.get("id"), Some(&json!(intents[0].id)));
        assert_eq!(mirrored.get("status"), Some(&json!("succeeded")));
        assert_eq!(mirrored.get("payment_method"), Some(&json!("tok_1")));
    }

    #[tokio::test]
    async fn document_destination_wins_over_default() {
        let fx = Fixture::new();
        let path = payment_path("p1");
        let mut body = request();
        body.insert("destination".into(), json!("acct_chef"));

        fx.create(Some("acct_default"))
            .handle(DocumentEvent::created(path.clone(), body), params(&path))
            .await;

        let transfer = fx.payments.intents()[0].transfer_data.clone().unwrap();
        assert_eq!(transfer.destination, "acct_chef");
    }

    #[tokio::test]
    async fn no_destination_means_no_split() {
        let fx = Fixture::new();
        let path = payment_path("p1");

        fx.create(None)
            .handle(DocumentEvent::created(path.clone(), request()), params(&path))
            .await;

        assert_eq!(fx.payments.intents()[0].transfer_data, None);
    }

    #[tokio::test]
    async fn duplicate_delivery_charges_once() {
        let fx = Fixture::new();
        let path = payment_path("p1");
        let handler = fx.create(None);

        for _ in 0..2 {
            handler
                .handle(DocumentEvent::created(path.clone(), request()), params(&path))
                .await;
        }

        assert_eq!(fx.payments.call_count("create_payment_intent"), 2);
        assert_eq!(fx.payments.intents().len(), 1);
    }

    #[tokio::test]
    async fn replay_after_confirmation_keeps_the_confirmed_status() {
        let fx = Fixture::new();
        fx.payments.set_create_status("requires_confirmation");
        let path = payment_path("p1");
        fx.store.insert(&path, request());
        let handler = fx.create(None);

        handler
            .handle(DocumentEvent::created(path.clone(), request()), params(&path))
            .await;
        let created = fx.store.document(&path).unwrap();
        fx.update()
            .handle(
                DocumentEvent::updated(path.clone(), request(), created),
                params(&path),
            )
            .await;
        fx.store.take_events();

        handler
            .handle(DocumentEvent::created(path.clone(), request()), params(&path))
            .await;

        let payment = fx.store.document(&path).unwrap();
        assert_eq!(payment.get("status"), Some(&json!("succeeded")));
        assert!(fx.store.take_events().is_empty());
        assert!(fx.reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn declined_card_leaves_only_the_error() {
        let fx = Fixture::new();
        let path = payment_path("p1");
        fx.store.insert(&path, request());
        fx.payments.set_method_error(
            "create_payment_intent",
            PaymentError::rejected("card_error", "Your card was declined."),
        );

        fx.create(None)
            .handle(DocumentEvent::created(path.clone(), request()), params(&path))
            .await;

        let mirrored = fx.store.document(&path).unwrap();
        assert_eq!(mirrored.get("error"), Some(&json!("Your card was declined.")));
        assert!(mirrored.get("status").is_none());
        assert!(mirrored.get("id").is_none());
        assert_eq!(fx.reporter.reports_for(CreatePaymentIntent::NAME).len(), 1);
    }

    #[tokio::test]
    async fn missing_card_token_is_a_validation_error() {
        let fx = Fixture::new();
        let path = payment_path("p1");
        let body = doc(json!({"total": 12.0, "currency": "usd"}));

        fx.create(None)
            .handle(DocumentEvent::created(path.clone(), body), params(&path))
            .await;

        assert!(!fx.payments.was_called("create_payment_intent"));
        let report = &fx.reporter.reports()[0];
        assert!(report.message.contains("payment_method"));
    }

    #[tokio::test]
    async fn requires_confirmation_confirms_once() {
        let fx = Fixture::new();
        fx.payments.set_create_status("requires_confirmation");
        let path = payment_path("p1");
        fx.create(None)
            .handle(DocumentEvent::created(path.clone(), request()), params(&path))
            .await;
        let created = fx.store.document(&path).unwrap();

        fx.update()
            .handle(
                DocumentEvent::updated(path.clone(), request(), created.clone()),
                params(&path),
            )
            .await;
        // A re-write in the same state is not a transition.
        fx.update()
            .handle(
                DocumentEvent::updated(path.clone(), created.clone(), created),
                params(&path),
            )
            .await;

        assert_eq!(fx.payments.call_count("confirm_payment_intent"), 1);
        let confirmed = fx.store.document(&path).unwrap();
        assert_eq!(confirmed.get("status"), Some(&json!("succeeded")));
    }

    #[tokio::test]
    async fn success_archives_order_and_sends_receipt() {
        let fx = Fixture::new();
        let customer = customer_path("u1");
        let pending = customer.child(ORDERS, "o1");
        fx.store.insert(&pending, doc(json!({"chef": "c1"})));
        for item in ["i1", "i2"] {
            fx.store.insert(
                &pending.subcollection(ORDER_ITEMS).doc(item),
                doc(json!({"dish": item})),
            );
        }
        let path = payment_path("p1");
        let before = request();
        let mut after = request();
        after.insert("id".into(), json!("pi_1"));
        after.insert("status".into(), json!("succeeded"));
        after.insert("amount".into(), json!(1200));

        fx.update()
            .handle(DocumentEvent::updated(path.clone(), before, after), params(&path))
            .await;

        assert!(fx.reporter.reports().is_empty());
        assert!(!fx.store.contains(&pending));
        assert!(fx.store.paths_in(&pending.subcollection(ORDER_ITEMS)).is_empty());

        let history = customer.child(ORDER_HISTORY, "o1");
        let archived = fx.store.document(&history).unwrap();
        assert_eq!(archived.get("chef"), Some(&json!("c1")));
        assert_eq!(archived.get("payment_id"), Some(&json!("p1")));
        assert!(archived.get("archived_at").is_some());
        assert_eq!(fx.store.paths_in(&history.subcollection(ORDER_ITEMS)).len(), 2);

        let profile = fx.store.document(&customer).unwrap();
        assert_ne!(profile.get("order_id"), Some(&json!("o1")));

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert!(sent[0].body.contains("12.00 USD"));
        assert!(sent[0].body.contains("pi_1"));
    }

    #[tokio::test]
    async fn receipt_failure_is_recorded_after_archiving() {
        let fx = Fixture::new();
        fx.mailer.fail_with(MailError::Transport("relay refused".into()));
        let path = payment_path("p1");
        let after = doc(json!({"id": "pi_1", "status": "succeeded", "amount": 500, "currency": "usd"}));

        fx.update()
            .handle(DocumentEvent::updated(path.clone(), request(), after), params(&path))
            .await;

        assert!(fx
            .store
            .contains(&customer_path("u1").child(ORDER_HISTORY, "o1")));
        let payment = fx.store.document(&path).unwrap();
        assert!(payment.get("error").is_some());
        assert_eq!(fx.reporter.reports_for(HandlePaymentUpdate::NAME).len(), 1);
    }

    #[tokio::test]
    async fn other_updates_are_ignored() {
        let fx = Fixture::new();
        let path = payment_path("p1");
        let before = doc(json!({"id": "pi_1", "status": "processing"}));
        let after = doc(json!({"id": "pi_1", "status": "requires_action"}));

        fx.update()
            .handle(DocumentEvent::updated(path.clone(), before, after), params(&path))
            .await;

        assert!(fx.payments.calls().is_empty());
        assert!(fx.mailer.sent().is_empty());
        assert!(fx.reporter.reports().is_empty());
    }
}

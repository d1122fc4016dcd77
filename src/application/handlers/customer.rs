//! Identity lifecycle: payment customers for new users, cleanup for
//! deleted ones.

use std::sync::Arc;

use crate::application::batch::{delete_collection, DELETE_BATCH_SIZE};
use crate::application::error::HandlerError;
use crate::application::failure::{FailureContext, FailureRecorder};
use crate::domain::customer::{customer_path, CustomerProfile, PAYMENT_METHODS};
use crate::domain::foundation::{encode, new_document_id};
use crate::ports::{CreateCustomerRequest, DocumentStore, PaymentProvider};

/// Read `customers/{uid}`, failing when it does not exist.
pub(super) async fn read_profile(
    store: &dyn DocumentStore,
    uid: &str,
) -> Result<CustomerProfile, HandlerError> {
    let path = customer_path(uid);
    let doc = store
        .get(&path)
        .await?
        .ok_or_else(|| HandlerError::not_found("customer", &path))?;
    Ok(CustomerProfile::from_document(&doc)?)
}

/// Creates the payment customer and profile document for a new user.
pub struct CreateCustomer {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    failures: FailureRecorder,
}

impl CreateCustomer {
    pub const NAME: &'static str = "create_customer";

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

    pub async fn handle(&self, uid: &str, email: Option<&str>) {
        if let Err(error) = self.run(uid, email).await {
            let path = customer_path(uid);
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        user: Some(uid),
                        annotate: Some(&path),
                        document: None,
                        annotate_existing: false,
                    },
                )
                .await;
        }
    }

    async fn run(&self, uid: &str, email: Option<&str>) -> Result<(), HandlerError> {
        // 1. Provider customer, tagged with the user id
        let customer = self
            .payments
            .create_customer(CreateCustomerRequest::for_user(uid, email.map(str::to_string)))
            .await?;

        // 2. Setup intent so the client can save a first card
        let intent = self.payments.create_setup_intent(&customer.id).await?;

        // 3. Profile with a fresh order id placeholder
        let profile = CustomerProfile {
            customer_id: Some(customer.id.clone()),
            setup_secret: Some(intent.client_secret),
            email_address: email.map(str::to_string),
            order_id: Some(new_document_id()),
            default_payment_method: None,
        };
        self.store
            .set(&customer_path(uid), encode("customer", &profile)?)
            .await?;

        tracing::info!(user = uid, customer_id = %customer.id, "Customer created");
        Ok(())
    }
}

/// Removes a deleted user's provider customer, saved cards and profile.
pub struct CleanupUser {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    failures: FailureRecorder,
}

impl CleanupUser {
    pub const NAME: &'static str = "cleanup_user";

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

    pub async fn handle(&self, uid: &str) {
        if let Err(error) = self.run(uid).await {
            let path = customer_path(uid);
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        user: Some(uid),
                        annotate: None,
                        document: Some(&path),
                        annotate_existing: false,
                    },
                )
                .await;
        }
    }

    async fn run(&self, uid: &str) -> Result<(), HandlerError> {
        let path = customer_path(uid);

        // 1. Provider customer, when one was ever created
        if let Some(doc) = self.store.get(&path).await? {
            let profile = CustomerProfile::from_document(&doc)?;
            if let Ok(customer_id) = profile.require_customer_id() {
                self.payments.delete_customer(customer_id).await?;
            }
        }

        // 2. Saved cards, then the profile itself
        let removed = delete_collection(
            self.store.as_ref(),
            &path.subcollection(PAYMENT_METHODS),
            DELETE_BATCH_SIZE,
        )
        .await?;
        self.store.delete(&path).await?;

        tracing::info!(user = uid, payment_methods = removed, "User data removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reporting::InMemoryErrorReporter;
    use crate::adapters::store::InMemoryDocumentStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::field;
    use crate::ports::PaymentError;
    use serde_json::json;

    struct Fixture {
        store: Arc<InMemoryDocumentStore>,
        payments: MockPaymentProvider,
        reporter: Arc<InMemoryErrorReporter>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(InMemoryDocumentStore::new()),
                payments: MockPaymentProvider::new(),
                reporter: Arc::new(InMemoryErrorReporter::new()),
            }
        }

        fn failures(&self) -> FailureRecorder {
            FailureRecorder::new(self.store.clone(), self.reporter.clone())
        }

        fn create(&self) -> CreateCustomer {
            CreateCustomer::new(
                self.store.clone(),
                Arc::new(self.payments.clone()),
                self.failures(),
            )
        }

        fn cleanup(&self) -> CleanupUser {
            CleanupUser::new(
                self.store.clone(),
                Arc::new(self.payments.clone()),
                self.failures(),
            )
        }
    }

    #[tokio::test]
    async fn new_user_gets_customer_and_setup_secret() {
        let fx = Fixture::new();

        fx.create().handle("u1", Some("a@x.com")).await;

        let doc = fx.store.document(&customer_path("u1")).unwrap();
        let profile = CustomerProfile::from_document(&doc).unwrap();
        let customer_id = profile.customer_id.unwrap();
        assert!(customer_id.starts_with("cus_"));
        assert!(profile.setup_secret.unwrap().contains("secret"));
        assert_eq!(profile.email_address.as_deref(), Some("a@x.com"));
        assert!(!profile.order_id.unwrap().is_empty());
        assert!(fx.payments.has_customer(&customer_id));
        let call = &fx.payments.calls_to("create_setup_intent")[0];
        assert_eq!(call.args, vec![customer_id]);
    }

    #[tokio::test]
    async fn provider_failure_is_written_and_reported() {
        let fx = Fixture::new();
        fx.payments.set_method_error(
            "create_customer",
            PaymentError::Network("connection reset".into()),
        );

        fx.create().handle("u1", Some("a@x.com")).await;

        let doc = fx.store.document(&customer_path("u1")).unwrap();
        assert_eq!(
            doc.get("error"),
            Some(&json!("An error occurred, developers have been alerted"))
        );
        assert!(doc.get("customer_id").is_none());
        assert_eq!(fx.reporter.reports_for(CreateCustomer::NAME).len(), 1);
    }

    #[tokio::test]
    async fn cleanup_removes_customer_and_cards() {
        let fx = Fixture::new();
        fx.create().handle("u1", Some("a@x.com")).await;
        let profile =
            CustomerProfile::from_document(&fx.store.document(&customer_path("u1")).unwrap())
                .unwrap();
        let methods = customer_path("u1").subcollection(PAYMENT_METHODS);
        for id in ["pm_1", "pm_2", "pm_3"] {
            fx.store.insert(&methods.doc(id), field("id", json!(id)));
        }

        fx.cleanup().handle("u1").await;

        assert!(!fx.store.contains(&customer_path("u1")));
        assert!(fx.store.paths_in(&methods).is_empty());
        assert!(!fx.payments.has_customer(&profile.customer_id.unwrap()));
        assert!(fx.reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn cleanup_without_profile_still_clears_cards() {
        let fx = Fixture::new();
        let methods = customer_path("u1").subcollection(PAYMENT_METHODS);
        fx.store.insert(&methods.doc("pm_1"), field("id", json!("pm_1")));

        fx.cleanup().handle("u1").await;

        assert!(fx.store.paths_in(&methods).is_empty());
        assert!(!fx.payments.was_called("delete_customer"));
    }

    #[tokio::test]
    async fn cleanup_failure_is_reported_without_recreating_profile() {
        let fx = Fixture::new();
        fx.store
            .insert(&customer_path("u1"), field("customer_id", json!("cus_gone")));

        fx.cleanup().handle("u1").await;

        // Unknown customer: the provider call fails before anything is deleted.
        let doc = fx.store.document(&customer_path("u1")).unwrap();
        assert!(doc.get("error").is_none());
        let reports = fx.reporter.reports_for(CleanupUser::NAME);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context["user"], "u1");
    }
}

//! Shared harness: real dispatcher wired to in-memory adapters.
//!
//! Writes made by handlers land in the in-memory store, which records the
//! change events the platform would deliver. `pump` replays them through
//! the dispatcher until the system settles.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;

use lidora_functions::adapters::{
    InMemoryDocumentStore, InMemoryErrorReporter, InMemoryMailer, InMemoryPushNotifier,
    MockPaymentProvider,
};
use lidora_functions::application::{Services, TriggerDispatcher, TriggerSettings};
use lidora_functions::config::AccountProfileConfig;
use lidora_functions::domain::foundation::{Document, DocumentPath};
use lidora_functions::domain::trigger::AuthEvent;

/// Upper bound on replay rounds; a handler that keeps re-triggering itself
/// fails the test instead of hanging it.
const MAX_ROUNDS: usize = 20;

pub struct Harness {
    pub store: Arc<InMemoryDocumentStore>,
    pub payments: MockPaymentProvider,
    pub mailer: Arc<InMemoryMailer>,
    pub push: Arc<InMemoryPushNotifier>,
    pub reporter: Arc<InMemoryErrorReporter>,
    pub dispatcher: TriggerDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_destination(None)
    }

    pub fn with_destination(destination: Option<&str>) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let payments = MockPaymentProvider::new();
        let mailer = Arc::new(InMemoryMailer::new());
        let push = Arc::new(InMemoryPushNotifier::new());
        let reporter = Arc::new(InMemoryErrorReporter::new());
        let services = Services {
            store: store.clone(),
            payments: Arc::new(payments.clone()),
            mailer: mailer.clone(),
            push: push.clone(),
            reporter: reporter.clone(),
            settings: TriggerSettings {
                from_email: "Lidora <noreply@lidora.app>".into(),
                operator_address: "ops@lidora.app".into(),
                device_token: "operator-device".into(),
                default_transfer_destination: destination.map(str::to_string),
                account_profile: AccountProfileConfig::default(),
            },
        };
        let dispatcher = TriggerDispatcher::new(&services);
        Self {
            store,
            payments,
            mailer,
            push,
            reporter,
            dispatcher,
        }
    }

    /// Dispatch recorded change events until none are left.
    /// Returns every handler that ran, in order.
    pub async fn pump(&self) -> Vec<&'static str> {
        let mut handled = Vec::new();
        for _ in 0..MAX_ROUNDS {
            let events = self.store.take_events();
            if events.is_empty() {
                return handled;
            }
            for event in events {
                handled.extend(self.dispatcher.dispatch_document(event).await);
            }
        }
        panic!("trigger events did not settle after {} rounds", MAX_ROUNDS);
    }

    /// Sign-up through the identity trigger, then settle.
    pub async fn sign_up(&self, uid: &str, email: &str) {
        self.dispatcher
            .dispatch_auth(AuthEvent::Created {
                uid: uid.to_string(),
                email: Some(email.to_string()),
            })
            .await;
        self.pump().await;
    }

    pub fn doc(&self, raw: &str) -> Option<Document> {
        self.store.document(&path(raw))
    }
}

pub fn path(raw: &str) -> DocumentPath {
    DocumentPath::parse(raw).unwrap()
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

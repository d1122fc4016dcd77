//! Routes incoming trigger events to their handlers.

use std::sync::Arc;

use crate::domain::foundation::PathPattern;
use crate::domain::notification::AppLifecycle;
use crate::domain::trigger::{AnalyticsEvent, AuthEvent, ChangeKind, DocumentEvent};

use super::failure::FailureRecorder;
use super::handlers::{
    AttachExternalAccount, AttachPaymentMethod, CleanupUser, CreateConnectedAccount,
    CreateCustomer, CreatePaymentIntent, DetachPaymentMethod, DocumentTrigger,
    HandlePaymentUpdate, NotifyAppLifecycle, NotifyLead, UpdatePaymentMethod,
};
use super::services::Services;

struct DocumentRoute {
    pattern: PathPattern,
    kind: ChangeKind,
    trigger: Arc<dyn DocumentTrigger>,
}

/// One registered document route, for startup logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub pattern: String,
    pub kind: ChangeKind,
    pub handler: &'static str,
}

/// Matches events to handlers and runs them.
///
/// Every handler catches its own errors, so dispatch never fails; it
/// returns the names of the handlers that ran.
pub struct TriggerDispatcher {
    routes: Vec<DocumentRoute>,
    create_customer: CreateCustomer,
    cleanup_user: CleanupUser,
    notify_app_lifecycle: NotifyAppLifecycle,
}

impl TriggerDispatcher {
    pub fn new(services: &Services) -> Self {
        let failures = FailureRecorder::new(services.store.clone(), services.reporter.clone());
        let settings = &services.settings;
        let store = || services.store.clone();
        let payments = || services.payments.clone();

        let mut dispatcher = Self {
            routes: Vec::new(),
            create_customer: CreateCustomer::new(store(), payments(), failures.clone()),
            cleanup_user: CleanupUser::new(store(), payments(), failures.clone()),
            notify_app_lifecycle: NotifyAppLifecycle::new(
                services.push.clone(),
                settings.device_token.clone(),
                failures.clone(),
            ),
        };

        dispatcher
            .route(
                "chefs/{userId}",
                ChangeKind::Create,
                CreateConnectedAccount::new(
                    store(),
                    payments(),
                    settings.account_profile.clone(),
                    failures.clone(),
                ),
            )
            .route(
                "chefs/{userId}/external_accounts/{token}",
                ChangeKind::Create,
                AttachExternalAccount::new(store(), payments(), failures.clone()),
            )
            .route(
                "customers/{userId}/payment_methods/{pushId}",
                ChangeKind::Create,
                AttachPaymentMethod::new(store(), payments(), failures.clone()),
            )
            .route(
                "customers/{userId}/payment_methods/{pushId}",
                ChangeKind::Update,
                UpdatePaymentMethod::new(store(), payments(), failures.clone()),
            )
            .route(
                "customers/{userId}/payment_methods/{pushId}",
                ChangeKind::Delete,
                DetachPaymentMethod::new(payments(), failures.clone()),
            )
            .route(
                "customers/{userId}/payments/{pushId}",
                ChangeKind::Create,
                CreatePaymentIntent::new(
                    store(),
                    payments(),
                    settings.default_transfer_destination.clone(),
                    failures.clone(),
                ),
            )
            .route(
                "customers/{userId}/payments/{pushId}",
                ChangeKind::Update,
                HandlePaymentUpdate::new(
                    store(),
                    payments(),
                    services.mailer.clone(),
                    settings.from_email.clone(),
                    failures.clone(),
                ),
            )
            .route(
                "potential_leads/{leadId}",
                ChangeKind::Create,
                NotifyLead::new(
                    services.mailer.clone(),
                    settings.from_email.clone(),
                    settings.operator_address.clone(),
                    failures,
                ),
            );
        dispatcher
    }

    fn route(
        &mut self,
        pattern: &str,
        kind: ChangeKind,
        trigger: impl DocumentTrigger + 'static,
    ) -> &mut Self {
        self.routes.push(DocumentRoute {
            pattern: PathPattern::new(pattern),
            kind,
            trigger: Arc::new(trigger),
        });
        self
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|route| RouteInfo {
                pattern: route.pattern.to_string(),
                kind: route.kind,
                handler: route.trigger.name(),
            })
            .collect()
    }

    pub async fn dispatch_document(&self, event: DocumentEvent) -> Vec<&'static str> {
        let mut handled = Vec::new();
        for route in self.routes.iter().filter(|r| r.kind == event.kind) {
            let Some(params) = route.pattern.matches(&event.path) else {
                continue;
            };
            tracing::debug!(
                handler = route.trigger.name(),
                path = %event.path,
                kind = %event.kind,
                "Dispatching document event"
            );
            route.trigger.handle(event.clone(), params).await;
            handled.push(route.trigger.name());
        }
        if handled.is_empty() {
            tracing::debug!(path = %event.path, kind = %event.kind, "No handler for document event");
        }
        handled
    }

    pub async fn dispatch_auth(&self, event: AuthEvent) -> Vec<&'static str> {
        match event {
            AuthEvent::Created { uid, email } => {
                self.create_customer.handle(&uid, email.as_deref()).await;
                vec![CreateCustomer::NAME]
            }
            AuthEvent::Deleted { uid } => {
                self.cleanup_user.handle(&uid).await;
                vec![CleanupUser::NAME]
            }
        }
    }

    pub async fn dispatch_analytics(&self, event: AnalyticsEvent) -> Vec<&'static str> {
        if AppLifecycle::from_event_name(&event.name).is_none() {
            tracing::debug!(event = %event.name, "No handler for analytics event");
            return Vec::new();
        }
        self.notify_app_lifecycle.handle(event).await;
        vec![NotifyAppLifecycle::NAME]
    }
}

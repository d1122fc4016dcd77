//! Operator notifications.

use std::sync::Arc;

use async_trait::async_trait;

use super::DocumentTrigger;
use crate::application::error::HandlerError;
use crate::application::failure::{FailureContext, FailureRecorder};
use crate::domain::foundation::PathParams;
use crate::domain::notification::{lifecycle_message, Lead};
use crate::domain::trigger::{AnalyticsEvent, DocumentEvent};
use crate::ports::{Mailer, PushNotifier};

/// Pushes installs and removals to the operator's device.
pub struct NotifyAppLifecycle {
    push: Arc<dyn PushNotifier>,
    device_token: String,
    failures: FailureRecorder,
}

impl NotifyAppLifecycle {
    pub const NAME: &'static str = "notify_app_lifecycle";

    pub fn new(
        push: Arc<dyn PushNotifier>,
        device_token: impl Into<String>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            push,
            device_token: device_token.into(),
            failures,
        }
    }

    pub async fn handle(&self, event: AnalyticsEvent) {
        if let Err(error) = self.run(&event).await {
            self.failures
                .record(Self::NAME, &error, FailureContext::default())
                .await;
        }
    }

    async fn run(&self, event: &AnalyticsEvent) -> Result<(), HandlerError> {
        let Some(message) = lifecycle_message(event) else {
            tracing::debug!(event = %event.name, "Analytics event ignored");
            return Ok(());
        };
        self.push.send(&self.device_token, message).await?;
        tracing::info!(event = %event.name, "Lifecycle notification sent");
        Ok(())
    }
}

/// Emails the operator about a new lead.
pub struct NotifyLead {
    mailer: Arc<dyn Mailer>,
    from_email: String,
    operator_address: String,
    failures: FailureRecorder,
}

impl NotifyLead {
    pub const NAME: &'static str = "notify_lead";

    pub fn new(
        mailer: Arc<dyn Mailer>,
        from_email: impl Into<String>,
        operator_address: impl Into<String>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            mailer,
            from_email: from_email.into(),
            operator_address: operator_address.into(),
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent) -> Result<(), HandlerError> {
        let lead = Lead::from_document(&event.current())?;
        self.mailer
            .send(lead.operator_email(&self.from_email, &self.operator_address))
            .await?;
        tracing::info!(lead = event.path.id(), "Lead forwarded to operator");
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for NotifyLead {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent, _params: PathParams) {
        if let Err(error) = self.run(&event).await {
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        document: Some(&event.path),
                        ..Default::default()
                    },
                )
                .await;
        }
    }
}

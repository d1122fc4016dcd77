//! Client handles and settings injected into every handler.

use std::sync::Arc;

use crate::config::{AccountProfileConfig, AppConfig};
use crate::ports::{DocumentStore, ErrorReporter, Mailer, PaymentProvider, PushNotifier};

/// Values handlers need from configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSettings {
    /// `From` header for outgoing mail, e.g. `Lidora <noreply@lidora.app>`.
    pub from_email: String,
    pub operator_address: String,
    /// Operator device that receives app lifecycle pushes.
    pub device_token: String,
    pub default_transfer_destination: Option<String>,
    pub account_profile: AccountProfileConfig,
}

impl TriggerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            from_email: config.email.from_header(),
            operator_address: config.email.operator_address.clone(),
            device_token: config.notification.device_token.clone(),
            default_transfer_destination: config.payment.default_transfer_destination.clone(),
            account_profile: config.payment.account_profile.clone(),
        }
    }
}

/// Shared client handles, built once in `main`.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub payments: Arc<dyn PaymentProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub push: Arc<dyn PushNotifier>,
    pub reporter: Arc<dyn ErrorReporter>,
    pub settings: TriggerSettings,
}

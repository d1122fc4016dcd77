//! Push notification configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Push notification configuration (FCM)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    /// FCM legacy server key
    pub fcm_server_key: String,

    /// Registration token of the operator's device
    pub device_token: String,

    /// Override for the FCM send endpoint (tests)
    pub fcm_endpoint: Option<String>,
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fcm_server_key.is_empty() {
            return Err(ValidationError::MissingRequired("FCM_SERVER_KEY"));
        }
        if self.device_token.is_empty() {
            return Err(ValidationError::MissingRequired("DEVICE_TOKEN"));
        }
        Ok(())
    }
}

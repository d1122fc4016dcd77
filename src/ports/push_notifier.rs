//! Push notifier port - device notifications to the operator.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::notification::PushMessage;

#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// Deliver `message` to one device registration token.
    async fn send(&self, device_token: &str, message: PushMessage) -> Result<(), PushError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PushError {
    #[error("push service rejected the message: {0}")]
    Rejected(String),

    #[error("push transport failed: {0}")]
    Transport(String),
}

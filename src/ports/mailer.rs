//! Mailer port - outbound plain-text email.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::notification::OutgoingEmail;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("invalid email address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("mail transport failed: {0}")]
    Transport(String),
}

//! Error type shared by every trigger handler.

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::ports::{MailError, PaymentError, PushError, StoreError};

/// Message written onto documents for every error the payment provider
/// did not explain itself.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred, developers have been alerted";

/// Anything a handler can fail with.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Push(#[from] PushError),

    #[error("{what} not found at {path}")]
    NotFound { what: &'static str, path: String },
}

impl HandlerError {
    pub fn not_found(what: &'static str, path: impl ToString) -> Self {
        HandlerError::NotFound {
            what,
            path: path.to_string(),
        }
    }

    /// Text safe to show the end user.
    ///
    /// Provider rejections (declined cards, invalid tokens) are passed
    /// through verbatim. Everything else is replaced by a generic message.
    pub fn user_facing_message(&self) -> String {
        match self {
            HandlerError::Payment(error) => error
                .user_message()
                .unwrap_or(GENERIC_ERROR_MESSAGE)
                .to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_rejections_pass_through() {
        let error: HandlerError =
            PaymentError::rejected("card_error", "Your card was declined.").into();
        assert_eq!(error.user_facing_message(), "Your card was declined.");
    }

    #[test]
    fn everything_else_is_generic() {
        let errors: Vec<HandlerError> = vec![
            PaymentError::Network("connection reset".into()).into(),
            PaymentError::Unexpected("HTTP 500".into()).into(),
            StoreError::Unavailable("deadline exceeded".into()).into(),
            ValidationError::missing_field("customer_id").into(),
            MailError::Transport("refused".into()).into(),
            HandlerError::not_found("customer", "customers/u1"),
        ];
        for error in errors {
            assert_eq!(error.user_facing_message(), GENERIC_ERROR_MESSAGE);
        }
    }

    #[test]
    fn raw_message_keeps_details() {
        let error: HandlerError = ValidationError::missing_field("customer_id").into();
        assert!(error.to_string().contains("customer_id"));
    }
}

//! In-memory mailer for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::notification::OutgoingEmail;
use crate::ports::{MailError, Mailer};

/// Captures sent emails; can be told to fail.
#[derive(Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Mutex<Option<MailError>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Fail every send with `error` until cleared.
    pub fn fail_with(&self, error: MailError) {
        *self.failure.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

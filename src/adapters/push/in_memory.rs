//! In-memory push notifier for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::notification::PushMessage;
use crate::ports::{PushError, PushNotifier};

/// Records `(device_token, message)` pairs.
#[derive(Default)]
pub struct InMemoryPushNotifier {
    sent: Mutex<Vec<(String, PushMessage)>>,
    failure: Mutex<Option<PushError>>,
}

impl InMemoryPushNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_with(&self, error: PushError) {
        *self.failure.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl PushNotifier for InMemoryPushNotifier {
    async fn send(&self, device_token: &str, message: PushMessage) -> Result<(), PushError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent
            .lock()
            .unwrap()
            .push((device_token.to_string(), message));
        Ok(())
    }
}

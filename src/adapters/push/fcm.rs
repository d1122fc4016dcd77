//! Firebase Cloud Messaging (legacy HTTP API) notifier.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::domain::notification::PushMessage;
use crate::ports::{PushError, PushNotifier};

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<SendResult>,
}

#[derive(Debug, Deserialize)]
struct SendResult {
    error: Option<String>,
}

/// Sends notifications with a server key.
pub struct FcmNotifier {
    server_key: SecretString,
    endpoint: String,
    http_client: reqwest::Client,
}

impl FcmNotifier {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: SecretString::new(server_key.into()),
            endpoint: FCM_SEND_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Set a custom send endpoint (for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Per-device failures come back as 200 with `failure > 0`.
fn rejection(body: &str) -> Result<(), PushError> {
    let response: SendResponse =
        serde_json::from_str(body).map_err(|e| PushError::Transport(e.to_string()))?;
    if response.failure == 0 {
        return Ok(());
    }
    let reason = response
        .results
        .into_iter()
        .find_map(|r| r.error)
        .unwrap_or_else(|| "unknown error".to_string());
    Err(PushError::Rejected(reason))
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    async fn send(&self, device_token: &str, message: PushMessage) -> Result<(), PushError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(
                "Authorization",
                format!("key={}", self.server_key.expose_secret()),
            )
            .json(&json!({
                "to": device_token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                }
            }))
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "FCM request rejected");
            return Err(PushError::Rejected(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        rejection(&body)
    }
}

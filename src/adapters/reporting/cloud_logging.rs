//! Error reporter that writes to Cloud Logging.
//!
//! Entries carry a `serviceContext` so Error Reporting groups them by
//! function; the context map travels alongside the message.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapters::gcp::GcpTokenSource;
use crate::ports::{ErrorReport, ErrorReporter, ReportError};

const LOGGING_WRITE_URL: &str = "https://logging.googleapis.com/v2/entries:write";

pub struct CloudLoggingReporter {
    project_id: String,
    service: String,
    endpoint: String,
    tokens: Arc<GcpTokenSource>,
    http_client: reqwest::Client,
}

impl CloudLoggingReporter {
    /// `service` is the deployment name reports are grouped under.
    pub fn new(
        project_id: impl Into<String>,
        service: impl Into<String>,
        tokens: Arc<GcpTokenSource>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            service: service.into(),
            endpoint: LOGGING_WRITE_URL.to_string(),
            tokens,
            http_client: reqwest::Client::new(),
        }
    }

    /// Set a custom write endpoint (for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn entry(&self, report: &ErrorReport) -> Value {
        json!({
            "entries": [{
                "logName": format!("projects/{}/logs/errors", self.project_id),
                "resource": {
                    "type": "cloud_function",
                    "labels": { "function_name": report.function },
                },
                "severity": "ERROR",
                "jsonPayload": {
                    "message": report.message,
                    "serviceContext": {
                        "service": self.service,
                        "resourceType": "cloud_function",
                    },
                    "context": report.context,
                },
            }]
        })
    }
}

#[async_trait]
impl ErrorReporter for CloudLoggingReporter {
    async fn report(&self, report: ErrorReport) -> Result<(), ReportError> {
        let mut request = self.http_client.post(&self.endpoint).json(&self.entry(&report));
        if let Some(token) = self
            .tokens
            .bearer()
            .await
            .map_err(|e| ReportError::Unavailable(e.to_string()))?
        {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReportError::Unavailable(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(ReportError::Unavailable(format!("{}: {}", status, body)))
        } else {
            Err(ReportError::Rejected(format!("{}: {}", status, body)))
        }
    }
}

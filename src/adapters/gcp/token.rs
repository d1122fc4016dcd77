//! OAuth access tokens for Google APIs.
//!
//! Three sources, picked once at startup:
//! - a static token from configuration,
//! - no token at all (local emulators),
//! - the instance metadata server, cached until shortly before expiry.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the server-reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("metadata server unreachable: {0}")]
    Unreachable(String),

    #[error("metadata server returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

enum Source {
    Static(SecretString),
    Anonymous,
    Metadata {
        url: String,
        cache: Mutex<Option<CachedToken>>,
    },
}

/// Access token source shared by every Google API adapter.
pub struct GcpTokenSource {
    source: Source,
    http_client: reqwest::Client,
}

impl GcpTokenSource {
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::with_source(Source::Static(SecretString::new(token.into())))
    }

    /// No credentials, for emulators.
    pub fn anonymous() -> Self {
        Self::with_source(Source::Anonymous)
    }

    pub fn metadata_server() -> Self {
        Self::metadata_server_at(METADATA_TOKEN_URL)
    }

    /// Metadata server at a custom URL (for testing).
    pub fn metadata_server_at(url: impl Into<String>) -> Self {
        Self::with_source(Source::Metadata {
            url: url.into(),
            cache: Mutex::new(None),
        })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            http_client: reqwest::Client::new(),
        }
    }

    /// Bearer token for the next request, `None` when running anonymously.
    pub async fn bearer(&self) -> Result<Option<String>, TokenError> {
        match &self.source {
            Source::Static(token) => Ok(Some(token.expose_secret().clone())),
            Source::Anonymous => Ok(None),
            Source::Metadata { url, cache } => {
                let mut cached = cache.lock().await;
                if let Some(token) = cached.as_ref() {
                    if token.expires_at > Utc::now() {
                        return Ok(Some(token.token.expose_secret().clone()));
                    }
                }
                let fresh = self.fetch(url).await?;
                let bearer = fresh.token.expose_secret().clone();
                *cached = Some(fresh);
                Ok(Some(bearer))
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<CachedToken, TokenError> {
        let response = self
            .http_client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| TokenError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        tracing::debug!(expires_in = token.expires_in, "Fetched metadata access token");

        Ok(CachedToken {
            token: SecretString::new(token.access_token),
            expires_at: Utc::now() + Duration::seconds(token.expires_in - EXPIRY_MARGIN_SECS),
        })
    }
}

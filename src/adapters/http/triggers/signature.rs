//! Trigger delivery signature verification.
//!
//! The platform signs every delivery with HMAC-SHA256 over `"{t}.{body}"`
//! and sends `X-Trigger-Signature: t=<unix>,v1=<hex>`. Timestamps are
//! checked against a replay window before the signature is compared.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-trigger-signature";

/// Maximum allowed age for a delivery (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future deliveries (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing X-Trigger-Signature header")]
    Missing,

    #[error("malformed signature header: {0}")]
    Malformed(String),

    #[error("signature timestamp is too old")]
    Expired,

    #[error("signature timestamp is in the future")]
    FromTheFuture,

    #[error("signature does not match")]
    Mismatch,
}

/// Parsed `X-Trigger-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Format: `t=<timestamp>,v1=<signature>`. Unknown fields are ignored.
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        if header.trim().is_empty() {
            return Err(SignatureError::Missing);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| SignatureError::Malformed("expected key=value".to_string()))?;
            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        SignatureError::Malformed("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        SignatureError::Malformed("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp
                .ok_or_else(|| SignatureError::Malformed("missing timestamp".to_string()))?,
            v1_signature: v1_signature
                .ok_or_else(|| SignatureError::Malformed("missing v1 signature".to_string()))?,
        })
    }
}

/// Verifies trigger deliveries against the shared signing secret.
pub struct TriggerSignatureVerifier {
    secret: SecretString,
}

impl TriggerSignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        self.verify_at(header, body, chrono::Utc::now().timestamp())
    }

    /// Verify as of `now` (unix seconds).
    pub fn verify_at(
        &self,
        header: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let header = SignatureHeader::parse(header.ok_or(SignatureError::Missing)?)?;

        let age = now.saturating_sub(header.timestamp);
        if age > MAX_EVENT_AGE_SECS {
            return Err(SignatureError::Expired);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(SignatureError::FromTheFuture);
        }

        let expected = self.compute(header.timestamp, body);
        if expected.len() != header.v1_signature.len()
            || !bool::from(expected.ct_eq(&header.v1_signature))
        {
            return Err(SignatureError::Mismatch);
        }
        Ok(())
    }

    /// Header value for `body` signed at `timestamp`.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        format!("t={},v1={}", timestamp, hex::encode(self.compute(timestamp, body)))
    }

    fn compute(&self, timestamp: i64, body: &[u8]) -> Vec<u8> {
        // HMAC-SHA256 takes keys of any length, so this arm never runs.
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
        else {
            return Vec::new();
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

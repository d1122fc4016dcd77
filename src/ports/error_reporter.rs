//! Error reporter port - forwards caught handler errors to the central
//! log sink where error reporting picks them up.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One caught error and where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Handler that caught the error.
    pub function: String,
    /// Raw (unsanitized) error text.
    pub message: String,
    /// Small string map, typically `user` and `document`.
    pub context: BTreeMap<String, String>,
}

impl ErrorReport {
    pub fn new(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, report: ErrorReport) -> Result<(), ReportError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("error sink unavailable: {0}")]
    Unavailable(String),

    #[error("error sink rejected the entry: {0}")]
    Rejected(String),
}

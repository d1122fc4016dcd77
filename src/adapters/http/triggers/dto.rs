//! Request and response bodies for trigger deliveries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Document, DocumentPath, ValidationError};
use crate::domain::trigger::{ChangeKind, DocumentEvent};

/// `POST /triggers/document` body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentEventRequest {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub before: Option<Document>,
    #[serde(default)]
    pub after: Option<Document>,
}

impl DocumentEventRequest {
    /// Validate the path and the snapshots `kind` requires.
    pub fn into_event(self) -> Result<DocumentEvent, ValidationError> {
        let path = DocumentPath::parse(&self.path)?;
        match (self.kind, self.before, self.after) {
            (ChangeKind::Create, _, Some(after)) => Ok(DocumentEvent::created(path, after)),
            (ChangeKind::Update, Some(before), Some(after)) => {
                Ok(DocumentEvent::updated(path, before, after))
            }
            (ChangeKind::Delete, Some(before), _) => Ok(DocumentEvent::deleted(path, before)),
            (ChangeKind::Delete, None, _) => Err(ValidationError::missing_field("before")),
            _ => Err(ValidationError::missing_field("after")),
        }
    }
}

/// Names of the handlers that ran for a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandledResponse {
    pub handled: Vec<String>,
}

impl From<Vec<&'static str>> for HandledResponse {
    fn from(names: Vec<&'static str>) -> Self {
        Self {
            handled: names.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

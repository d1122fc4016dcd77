//! Trigger events delivered by the hosting platform.
//!
//! Each event is passed by value into exactly one handler invocation.

use serde::{Deserialize, Serialize};

use super::foundation::{Document, DocumentPath};

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// A document change: the document's path plus its state on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEvent {
    pub path: DocumentPath,
    pub kind: ChangeKind,
    pub before: Option<Document>,
    pub after: Option<Document>,
}

impl DocumentEvent {
    pub fn created(path: DocumentPath, after: Document) -> Self {
        Self {
            path,
            kind: ChangeKind::Create,
            before: None,
            after: Some(after),
        }
    }

    pub fn updated(path: DocumentPath, before: Document, after: Document) -> Self {
        Self {
            path,
            kind: ChangeKind::Update,
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn deleted(path: DocumentPath, before: Document) -> Self {
        Self {
            path,
            kind: ChangeKind::Delete,
            before: Some(before),
            after: None,
        }
    }

    /// The most recent known state: `after`, or `before` for deletes.
    pub fn current(&self) -> Document {
        self.after
            .clone()
            .or_else(|| self.before.clone())
            .unwrap_or_default()
    }

    /// State before the change, empty for creates.
    pub fn before_or_empty(&self) -> Document {
        self.before.clone().unwrap_or_default()
    }
}

/// Identity provider lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuthEvent {
    Created { uid: String, email: Option<String> },
    Deleted { uid: String },
}

impl AuthEvent {
    pub fn uid(&self) -> &str {
        match self {
            AuthEvent::Created { uid, .. } | AuthEvent::Deleted { uid } => uid,
        }
    }
}

/// Analytics conversion event (`first_open`, `app_remove`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(default)]
    pub user: AnalyticsUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsUser {
    #[serde(default)]
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub geo_info: GeoInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub mobile_model_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn current_prefers_after_state() {
        let path = DocumentPath::new("chefs", "u1");
        let before = json!({"a": 1}).as_object().cloned().unwrap();
        let after = json!({"a": 2}).as_object().cloned().unwrap();
        let event = DocumentEvent::updated(path.clone(), before.clone(), after.clone());
        assert_eq!(event.current(), after);

        let deleted = DocumentEvent::deleted(path, before.clone());
        assert_eq!(deleted.current(), before);
        assert!(deleted.after.is_none());
    }

    #[test]
    fn created_event_has_empty_before() {
        let event = DocumentEvent::created(DocumentPath::new("chefs", "u1"), Document::new());
        assert!(event.before_or_empty().is_empty());
        assert_eq!(event.kind, ChangeKind::Create);
    }

    #[test]
    fn auth_event_deserializes_by_kind() {
        let created: AuthEvent =
            serde_json::from_value(json!({"kind": "created", "uid": "u1", "email": "a@x.com"}))
                .unwrap();
        assert_eq!(created.uid(), "u1");

        let deleted: AuthEvent =
            serde_json::from_value(json!({"kind": "deleted", "uid": "u2"})).unwrap();
        assert_eq!(deleted, AuthEvent::Deleted { uid: "u2".into() });
    }

    #[test]
    fn analytics_event_tolerates_missing_user_info() {
        let event: AnalyticsEvent = serde_json::from_value(json!({"name": "first_open"})).unwrap();
        assert_eq!(event.user.geo_info.city, "");
    }
}

//! Document paths and the patterns triggers are registered under.
//!
//! Paths alternate collection and document segments:
//! `customers/{userId}/payments/{pushId}` names a document, its parent
//! collection is `customers/{userId}/payments`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

fn split_segments(raw: &str) -> Result<Vec<String>, ValidationError> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("path"));
    }
    let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ValidationError::invalid_format(
            "path",
            format!("'{}' contains an empty segment", raw),
        ));
    }
    Ok(segments)
}

/// Path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Parse a slash-separated document path.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let segments = split_segments(raw)?;
        if segments.len() % 2 != 0 {
            return Err(ValidationError::invalid_format(
                "path",
                format!("'{}' names a collection, not a document", raw),
            ));
        }
        Ok(Self { segments })
    }

    /// Top-level document `collection/id`.
    pub fn new(collection: &str, id: &str) -> Self {
        Self {
            segments: vec![collection.to_string(), id.to_string()],
        }
    }

    /// Document id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection that contains this document.
    pub fn collection(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Document that owns the containing collection, if any.
    pub fn parent(&self) -> Option<DocumentPath> {
        self.collection().parent()
    }

    /// Subcollection of this document.
    pub fn subcollection(&self, name: &str) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        CollectionPath { segments }
    }

    /// Document `id` inside the subcollection `collection`.
    pub fn child(&self, collection: &str, id: &str) -> DocumentPath {
        self.subcollection(collection).doc(id)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.to_string()
    }
}

/// Path of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Parse a slash-separated collection path.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let segments = split_segments(raw)?;
        if segments.len() % 2 != 1 {
            return Err(ValidationError::invalid_format(
                "path",
                format!("'{}' names a document, not a collection", raw),
            ));
        }
        Ok(Self { segments })
    }

    /// Top-level collection.
    pub fn root(name: &str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    /// Document `id` in this collection.
    pub fn doc(&self, id: &str) -> DocumentPath {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        DocumentPath { segments }
    }

    /// Collection name (last segment).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Document owning this collection; `None` for top-level collections.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether `path` is a direct member of this collection.
    pub fn contains(&self, path: &DocumentPath) -> bool {
        path.segments.len() == self.segments.len() + 1
            && path.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Param(String),
}

/// Document path pattern such as `customers/{userId}/payments/{pushId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Build a pattern. `{name}` segments capture one path segment.
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PatternSegment::Param(name.to_string()),
                None => PatternSegment::Literal(s.to_string()),
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path` segment by segment, returning the captured parameters.
    pub fn matches(&self, path: &DocumentPath) -> Option<PathParams> {
        if path.segments.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(&path.segments) {
            match pattern {
                PatternSegment::Literal(literal) if literal == actual => {}
                PatternSegment::Literal(_) => return None,
                PatternSegment::Param(name) => {
                    params.insert(name.clone(), actual.clone());
                }
            }
        }
        Some(PathParams(params))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Parameters captured by a [`PathPattern`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Captured value, or a validation error naming the parameter.
    pub fn require(&self, name: &str) -> Result<&str, ValidationError> {
        self.get(name)
            .ok_or_else(|| ValidationError::missing_field(name))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }
}

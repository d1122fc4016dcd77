//! Document store port - the managed document database the triggers watch.
//!
//! Every handler reads and writes through this port. Writes made here are
//! what the platform turns into the follow-up trigger events, so handlers
//! never call each other directly.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{CollectionPath, Document, DocumentPath};

/// Port for document reads and writes.
///
/// `merge` is shallow: top-level keys in `fields` replace the stored keys
/// and every other stored key is kept. It creates the document when it
/// does not exist yet.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document. `Ok(None)` when it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite a document.
    async fn set(&self, path: &DocumentPath, document: Document) -> Result<(), StoreError>;

    /// Shallow-merge `fields` into a document, creating it if missing.
    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError>;

    /// Shallow-merge `fields` into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] instead of creating it.
    async fn update(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document is not an error.
    ///
    /// Subcollections are left untouched.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// One page of a collection's direct members, ordered by document id.
    async fn list(
        &self,
        collection: &CollectionPath,
        page: PageRequest,
    ) -> Result<Page, StoreError>;
}

/// Page size and cursor for [`DocumentStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub size: usize,
    /// Cursor returned as [`Page::next`] by the previous call.
    pub after: Option<String>,
}

impl PageRequest {
    pub fn first(size: usize) -> Self {
        Self { size, after: None }
    }

    pub fn after(size: usize, cursor: impl Into<String>) -> Self {
        Self {
            size,
            after: Some(cursor.into()),
        }
    }
}

/// A listed document with its path.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub path: DocumentPath,
    pub data: Document,
}

/// One page of listed documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub documents: Vec<StoredDocument>,
    /// Cursor for the following page, `None` on the last page.
    pub next: Option<String>,
}

/// Errors from document store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no document at {0}")]
    NotFound(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document store rejected {path}: {message}")]
    Rejected { path: String, message: String },

    #[error("malformed document at {path}: {message}")]
    Malformed { path: String, message: String },
}

//! In-memory document store for testing.
//!
//! Stores documents by path and records the change event every write
//! would raise on the real platform, so tests can replay those events
//! through the dispatcher.
//!
//! # Panics
//!
//! Methods may panic if internal locks are poisoned. This adapter is meant
//! for tests and local runs, not production.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{CollectionPath, Document, DocumentPath};
use crate::domain::trigger::DocumentEvent;
use crate::ports::{DocumentStore, Page, PageRequest, StoreError, StoredDocument};

/// In-memory document store.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryDocumentStore::new();
/// store.insert(&path, doc);
///
/// handler.on_event(...).await;
///
/// for event in store.take_events() {
///     dispatcher.dispatch_document(event).await;
/// }
/// ```
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentPath, Document>>,
    events: RwLock<Vec<DocumentEvent>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Seed a document without recording an event.
    pub fn insert(&self, path: &DocumentPath, document: Document) {
        self.documents
            .write()
            .expect("InMemoryDocumentStore: documents lock poisoned")
            .insert(path.clone(), document);
    }

    /// Current body of a document.
    pub fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.documents
            .read()
            .expect("InMemoryDocumentStore: documents lock poisoned")
            .get(path)
            .cloned()
    }

    pub fn contains(&self, path: &DocumentPath) -> bool {
        self.document(path).is_some()
    }

    /// Paths of every stored document directly inside `collection`.
    pub fn paths_in(&self, collection: &CollectionPath) -> Vec<DocumentPath> {
        self.documents
            .read()
            .expect("InMemoryDocumentStore: documents lock poisoned")
            .keys()
            .filter(|path| collection.contains(path))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .expect("InMemoryDocumentStore: documents lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain the change events recorded since the last call.
    pub fn take_events(&self) -> Vec<DocumentEvent> {
        std::mem::take(
            &mut *self
                .events
                .write()
                .expect("InMemoryDocumentStore: events lock poisoned"),
        )
    }

    fn write(&self, path: &DocumentPath, next: Document) {
        let before = self
            .documents
            .write()
            .expect("InMemoryDocumentStore: documents lock poisoned")
            .insert(path.clone(), next.clone());

        let event = match before {
            None => Some(DocumentEvent::created(path.clone(), next)),
            Some(before) if before != next => {
                Some(DocumentEvent::updated(path.clone(), before, next))
            }
            Some(_) => None,
        };
        if let Some(event) = event {
            self.record(event);
        }
    }

    fn record(&self, event: DocumentEvent) {
        self.events
            .write()
            .expect("InMemoryDocumentStore: events lock poisoned")
            .push(event);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(self.document(path))
    }

    async fn set(&self, path: &DocumentPath, document: Document) -> Result<(), StoreError> {
        self.write(path, document);
        Ok(())
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        let mut next = self.document(path).unwrap_or_default();
        next.extend(fields);
        self.write(path, next);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        let mut next = self
            .document(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        next.extend(fields);
        self.write(path, next);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let removed = self
            .documents
            .write()
            .expect("InMemoryDocumentStore: documents lock poisoned")
            .remove(path);
        if let Some(before) = removed {
            self.record(DocumentEvent::deleted(path.clone(), before));
        }
        Ok(())
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        page: PageRequest,
    ) -> Result<Page, StoreError> {
        let documents = self
            .documents
            .read()
            .expect("InMemoryDocumentStore: documents lock poisoned");

        let mut matching: Vec<StoredDocument> = documents
            .iter()
            .filter(|(path, _)| collection.contains(path))
            .filter(|(path, _)| match page.after.as_deref() {
                Some(cursor) => path.id() > cursor,
                None => true,
            })
            .map(|(path, data)| StoredDocument {
                path: path.clone(),
                data: data.clone(),
            })
            .collect();
        matching.sort_by(|a, b| a.path.id().cmp(b.path.id()));

        let has_more = matching.len() > page.size;
        matching.truncate(page.size);
        let next = if has_more {
            matching.last().map(|doc| doc.path.id().to_string())
        } else {
            None
        };

        Ok(Page {
            documents: matching,
            next,
        })
    }
}

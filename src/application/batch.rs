//! Collection-wide copy and delete.
//!
//! Both walk a collection a page at a time so a large collection never
//! sits in memory at once.

use crate::domain::foundation::CollectionPath;
use crate::ports::{DocumentStore, PageRequest, StoreError};

/// Page size used when clearing collections.
pub const DELETE_BATCH_SIZE: usize = 10;

/// Page size used when copying collections.
pub const COPY_BATCH_SIZE: usize = 100;

/// Delete every direct member of `collection`. Returns how many were deleted.
///
/// Re-reads the first page until it comes back empty, so documents added
/// while the loop runs are deleted as well.
pub async fn delete_collection(
    store: &dyn DocumentStore,
    collection: &CollectionPath,
    batch_size: usize,
) -> Result<usize, StoreError> {
    let batch_size = batch_size.max(1);
    let mut deleted = 0;
    loop {
        let page = store.list(collection, PageRequest::first(batch_size)).await?;
        if page.documents.is_empty() {
            break;
        }
        for document in &page.documents {
            store.delete(&document.path).await?;
            deleted += 1;
        }
    }
    tracing::debug!(collection = %collection, deleted, "Collection cleared");
    Ok(deleted)
}

/// Copy every direct member of `from` into `to`, keeping document ids.
/// Returns how many were copied.
pub async fn copy_collection(
    store: &dyn DocumentStore,
    from: &CollectionPath,
    to: &CollectionPath,
    batch_size: usize,
) -> Result<usize, StoreError> {
    let batch_size = batch_size.max(1);
    let mut copied = 0;
    let mut request = PageRequest::first(batch_size);
    loop {
        let page = store.list(from, request).await?;
        for document in page.documents {
            store
                .set(&to.doc(document.path.id()), document.data)
                .await?;
            copied += 1;
        }
        match page.next {
            Some(cursor) => request = PageRequest::after(batch_size, cursor),
            None => break,
        }
    }
    tracing::debug!(from = %from, to = %to, copied, "Collection copied");
    Ok(copied)
}

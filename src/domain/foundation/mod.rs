//! Foundation module - Shared domain primitives.
//!
//! Contains document bodies, document paths and path patterns, and the
//! validation error used when reading typed values out of documents.

mod document;
mod errors;
mod path;

pub use document::{decode, encode, field, required_str, str_field, Document};
pub use errors::ValidationError;
pub use path::{CollectionPath, DocumentPath, PathParams, PathPattern};

/// Allocate a fresh document id, like a store-side auto id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

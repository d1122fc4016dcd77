//! Firestore adapter for the `DocumentStore` port.

mod client;
mod value;

pub use client::FirestoreDocumentStore;
pub use value::{decode_fields, encode_fields};

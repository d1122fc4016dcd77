//! Document store adapters.
//!
//! - `InMemoryDocumentStore` - Test store that records change events
//!
//! The production store lives in `adapters::firestore`.

mod in_memory;

pub use in_memory::InMemoryDocumentStore;

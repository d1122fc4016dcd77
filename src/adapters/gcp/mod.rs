//! Google Cloud plumbing shared by the Firestore and Cloud Logging adapters.

mod token;

pub use token::{GcpTokenSource, TokenError};

//! Lidora Functions - Backend triggers for the Lidora chef marketplace
//!
//! This crate reacts to document-store changes, identity lifecycle events and
//! analytics conversions. Handlers keep Stripe customers, cards, connected
//! accounts and payment intents in step with the app's documents, archive
//! settled orders and notify the operator by email and push.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

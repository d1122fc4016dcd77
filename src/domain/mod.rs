//! Domain layer: documents, events and the rules that read them.
//!
//! # Module Organization
//!
//! - `foundation` - Document bodies, paths, path patterns, validation errors
//! - `trigger` - Document, auth and analytics events
//! - `customer` - Customer profile documents
//! - `payment_method` - Card documents, expiry and primary-flag changes
//! - `payment` - Charge requests and payment status transitions
//! - `chef` - Merchant profiles and connected-account references
//! - `notification` - Push messages, lead and receipt emails

pub mod chef;
pub mod customer;
pub mod foundation;
pub mod notification;
pub mod payment;
pub mod payment_method;
pub mod trigger;

//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe, including:
//! - Customers, setup intents and saved cards
//! - Custom connected accounts and their external accounts
//! - Payment intents with split transfers
//!
//! # Security
//!
//! - The secret key is held in a `secrecy::SecretString`
//! - Payment intent creation forwards the caller's idempotency key
//!
//! # Configuration
//!
//! - `LIDORA__PAYMENT__STRIPE_API_KEY`: Stripe secret API key
//! - `LIDORA__PAYMENT__API_VERSION`: pinned API version (default 2020-03-02)

mod mock_payment_provider;
mod stripe_adapter;
mod stripe_types;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter, DEFAULT_API_VERSION};
pub use stripe_types::FormParams;

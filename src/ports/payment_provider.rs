//! Payment provider port for the hosted payment API.
//!
//! Covers the customer, card, connected-account and payment-intent calls
//! the trigger handlers make. Objects the handlers mirror verbatim onto
//! documents ([`PaymentIntent`], [`ExternalAccount`]) keep every field the
//! provider returned in `extra`.
//!
//! # Idempotency
//!
//! Only [`CreatePaymentIntentRequest::idempotency_key`] is forwarded to the
//! provider. Implementations must return the original intent when the same
//! key is replayed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{encode, Document, ValidationError};
use crate::domain::payment_method::CardExpiry;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a customer.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError>;

    /// Delete a customer and everything the provider keeps for it.
    async fn delete_customer(&self, customer_id: &str) -> Result<(), PaymentError>;

    /// Make `payment_method_id` the customer's default for invoices.
    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), PaymentError>;

    /// Create a setup intent so the client can save a card.
    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError>;

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError>;

    async fn retrieve_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError>;

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<(), PaymentError>;

    async fn update_payment_method_expiry(
        &self,
        payment_method_id: &str,
        expiry: CardExpiry,
    ) -> Result<PaymentMethod, PaymentError>;

    /// Create a custom connected account for a merchant.
    async fn create_connected_account(
        &self,
        request: CreateConnectedAccountRequest,
    ) -> Result<ConnectedAccount, PaymentError>;

    /// Attach a bank account or debit card token to a connected account.
    async fn create_external_account(
        &self,
        account_id: &str,
        token: &str,
    ) -> Result<ExternalAccount, PaymentError>;

    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn confirm_payment_intent(&self, intent_id: &str)
        -> Result<PaymentIntent, PaymentError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: Option<String>,
    /// Stored on the provider customer; carries `user_id`.
    pub metadata: BTreeMap<String, String>,
}

impl CreateCustomerRequest {
    pub fn for_user(uid: &str, email: Option<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("user_id".to_string(), uid.to_string());
        Self { email, metadata }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: String,
}

/// Card attributes of a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub brand: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// Split of a charge paid out to a connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferData {
    pub amount: i64,
    pub destination: String,
}

/// Request to create (and immediately confirm) a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub customer_id: String,
    /// Card token the intent builds its `payment_method_data` from.
    pub card_token: String,
    pub receipt_email: Option<String>,
    pub transfer: Option<TransferData>,
    pub confirm: bool,
    pub off_session: bool,
    pub idempotency_key: String,
}

/// Provider payment intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_data: Option<TransferData>,
    /// All other fields as returned by the provider.
    #[serde(flatten)]
    pub extra: Document,
}

impl PaymentIntent {
    /// Full intent as a document body.
    pub fn to_document(&self) -> Result<Document, ValidationError> {
        encode("payment intent", self)
    }
}

/// Individual's address for a connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub country: String,
    pub line1: String,
    pub postal_code: String,
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthDate {
    pub day: u32,
    pub month: u32,
    pub year: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub ssn_last_4: String,
    pub address: Address,
    pub dob: BirthDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub mcc: String,
    pub url: String,
    pub product_description: String,
}

/// Terms-of-service acceptance recorded on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TosAcceptance {
    /// Unix seconds.
    pub date: i64,
    pub ip: String,
}

/// Request to create a custom connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConnectedAccountRequest {
    pub country: String,
    pub email: String,
    pub business_type: String,
    pub individual: Individual,
    pub business_profile: BusinessProfile,
    /// Capabilities to request, e.g. `card_payments`, `transfers`.
    pub capabilities: Vec<String>,
    pub tos_acceptance: TosAcceptance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(flatten)]
    pub extra: Document,
}

/// Bank account or card attached to a connected account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAccount {
    pub id: String,
    #[serde(flatten)]
    pub extra: Document,
}

impl ExternalAccount {
    pub fn to_document(&self) -> Result<Document, ValidationError> {
        encode("external account", self)
    }
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The provider answered with a typed error (card declined, invalid
    /// request, ...). Its message is safe to show to the user.
    #[error("{category}: {message}")]
    Rejected {
        category: String,
        code: Option<String>,
        message: String,
    },

    #[error("payment provider unreachable: {0}")]
    Network(String),

    #[error("unexpected payment provider response: {0}")]
    Unexpected(String),
}

impl PaymentError {
    pub fn rejected(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            category: category.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Provider error message when the error is user-presentable.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            PaymentError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}

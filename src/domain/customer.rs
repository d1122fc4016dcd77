//! Customer profile documents (`customers/{uid}`).

use serde::{Deserialize, Serialize};

use super::foundation::{decode, Document, DocumentPath, ValidationError};

pub const CUSTOMERS: &str = "customers";
pub const PAYMENT_METHODS: &str = "payment_methods";
pub const PAYMENTS: &str = "payments";
pub const ORDERS: &str = "orders";
pub const ORDER_HISTORY: &str = "order_history";
pub const ORDER_ITEMS: &str = "items";

/// Path of the profile document for `uid`.
pub fn customer_path(uid: &str) -> DocumentPath {
    DocumentPath::new(CUSTOMERS, uid)
}

/// Profile mirrored for every identity-provider user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_payment_method: Option<String>,
}

impl CustomerProfile {
    pub fn from_document(doc: &Document) -> Result<Self, ValidationError> {
        decode("customer", doc)
    }

    /// Payment-provider customer id, required by every charge path.
    pub fn require_customer_id(&self) -> Result<&str, ValidationError> {
        self.customer_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::missing_field("customer_id"))
    }

    pub fn require_order_id(&self) -> Result<&str, ValidationError> {
        self.order_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::missing_field("order_id"))
    }
}

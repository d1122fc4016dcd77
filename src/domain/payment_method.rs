//! Payment-method documents (`customers/{uid}/payment_methods/{pmId}`).

use serde::{Deserialize, Serialize};

use super::foundation::{decode, encode, Document, ValidationError};

/// Card expiry as mirrored onto the document (`month`, `year`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiry {
    pub month: u32,
    pub year: i32,
}

impl CardExpiry {
    pub fn new(month: u32, year: i32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::out_of_range("month", 1, 12, month as i64));
        }
        Ok(Self { month, year })
    }
}

/// Client-written and adapter-enriched payment-method fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

impl PaymentMethodDocument {
    pub fn from_document(doc: &Document) -> Result<Self, ValidationError> {
        decode("payment method", doc)
    }

    /// Provider payment-method id: the `id` field, else the document id.
    pub fn provider_id<'a>(&'a self, document_id: &'a str) -> &'a str {
        self.id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(document_id)
    }

    fn expiry(&self) -> Option<(Option<u32>, Option<i32>)> {
        if self.month.is_none() && self.year.is_none() {
            None
        } else {
            Some((self.month, self.year))
        }
    }

    fn is_primary(&self) -> bool {
        self.primary == Some(true)
    }
}

/// Display attributes copied from the provider onto the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDisplay {
    pub brand: String,
    pub last4: String,
    pub month: u32,
    pub year: i32,
    pub primary: bool,
}

impl CardDisplay {
    pub fn to_document(&self) -> Result<Document, ValidationError> {
        encode("card display", self)
    }
}

/// New expiry to push to the provider, if the update changed it.
///
/// Only documents that already carried an expiry count: the enrichment
/// write that first mirrors `month`/`year` is not a change.
pub fn expiry_change(
    before: &Document,
    after: &Document,
) -> Result<Option<CardExpiry>, ValidationError> {
    let before = PaymentMethodDocument::from_document(before)?;
    let after = PaymentMethodDocument::from_document(after)?;

    let Some(previous) = before.expiry() else {
        return Ok(None);
    };
    if after.expiry() == Some(previous) {
        return Ok(None);
    }
    let month = after
        .month
        .ok_or_else(|| ValidationError::missing_field("month"))?;
    let year = after
        .year
        .ok_or_else(|| ValidationError::missing_field("year"))?;
    CardExpiry::new(month, year).map(Some)
}

/// Whether `primary` flipped to `true` in this update.
pub fn became_primary(before: &Document, after: &Document) -> Result<bool, ValidationError> {
    let before = PaymentMethodDocument::from_document(before)?;
    let after = PaymentMethodDocument::from_document(after)?;
    Ok(!before.is_primary() && after.is_primary())
}

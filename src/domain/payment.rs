//! Payment documents (`customers/{uid}/payments/{paymentId}`) and the
//! status transitions that drive confirmation and order archiving.
//!
//! A payment document starts as a client charge request. The provider's
//! payment intent is merged back onto it, so later updates carry the
//! intent `id` and `status`:
//!
//! ```text
//! created ──► requires_confirmation ──► succeeded
//!    │                  └──────────────► error
//!    ├──► succeeded
//!    └──► error
//! ```

use serde::{Deserialize, Serialize};

use super::foundation::{decode, str_field, Document, ValidationError};

/// Largest major-unit amount accepted (Stripe caps charges at 8 digits).
const MAX_MAJOR_AMOUNT: f64 = 999_999.99;

/// Convert a major-unit amount (`12.00`) into minor units (`1200`),
/// rounding half away from zero.
pub fn to_minor_units(field: &str, major: f64) -> Result<i64, ValidationError> {
    if !major.is_finite() {
        return Err(ValidationError::invalid_format(field, "not a finite number"));
    }
    if !(0.0..=MAX_MAJOR_AMOUNT).contains(&major) {
        return Err(ValidationError::out_of_range(
            field,
            0,
            MAX_MAJOR_AMOUNT as i64,
            major as i64,
        ));
    }
    Ok((major * 100.0).round() as i64)
}

/// Client-written charge request fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentDocument {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

/// Validated charge, amounts in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount: i64,
    pub transfer_amount: Option<i64>,
    pub currency: String,
    pub card_token: String,
    pub destination: Option<String>,
}

impl PaymentDocument {
    pub fn from_document(doc: &Document) -> Result<Self, ValidationError> {
        decode("payment", doc)
    }

    /// Validate the request. `total` wins over `amount` for the charge.
    pub fn charge_request(&self) -> Result<ChargeRequest, ValidationError> {
        let amount = match (self.total, self.amount) {
            (Some(total), _) => to_minor_units("total", total)?,
            (None, Some(amount)) => to_minor_units("amount", amount)?,
            (None, None) => return Err(ValidationError::missing_field("total")),
        };
        if amount == 0 {
            return Err(ValidationError::out_of_range("total", 1, i64::MAX, 0));
        }
        let transfer_amount = self
            .subtotal
            .map(|subtotal| to_minor_units("subtotal", subtotal))
            .transpose()?;

        let currency = self
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ValidationError::missing_field("currency"))?
            .to_lowercase();

        let card_token = self
            .payment_method
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ValidationError::missing_field("payment_method"))?
            .to_string();

        Ok(ChargeRequest {
            amount,
            transfer_amount,
            currency,
            card_token,
            destination: self.destination.clone().filter(|d| !d.trim().is_empty()),
        })
    }
}

/// Payment intent status as mirrored onto the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "requires_payment_method" => PaymentStatus::RequiresPaymentMethod,
            "requires_confirmation" => PaymentStatus::RequiresConfirmation,
            "requires_action" => PaymentStatus::RequiresAction,
            "processing" => PaymentStatus::Processing,
            "requires_capture" => PaymentStatus::RequiresCapture,
            "canceled" => PaymentStatus::Canceled,
            "succeeded" => PaymentStatus::Succeeded,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentStatus::RequiresAction => "requires_action",
            PaymentStatus::Processing => "processing",
            PaymentStatus::RequiresCapture => "requires_capture",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Other(s) => s,
        }
    }

    fn of(doc: &Document) -> Option<Self> {
        str_field(doc, "status").map(Self::parse)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an update to a payment document asks of the payment adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    /// Status moved into `requires_confirmation`.
    NeedsConfirmation { intent_id: String },
    /// Status moved into `succeeded`.
    Succeeded { intent_id: String },
    /// Nothing to do: unchanged status or an uninteresting state.
    None,
}

/// Compare `before` and `after` states of a payment document.
///
/// Only an actual change of `status` produces work, so re-writes of a
/// document that already sits in a state never trigger a second call.
pub fn status_transition(
    before: &Document,
    after: &Document,
) -> Result<StatusTransition, ValidationError> {
    let Some(next) = PaymentStatus::of(after) else {
        return Ok(StatusTransition::None);
    };
    if PaymentStatus::of(before).as_ref() == Some(&next) {
        return Ok(StatusTransition::None);
    }
    let intent_id = || {
        str_field(after, "id")
            .map(str::to_string)
            .ok_or_else(|| ValidationError::missing_field("id"))
    };
    match next {
        PaymentStatus::RequiresConfirmation => Ok(StatusTransition::NeedsConfirmation {
            intent_id: intent_id()?,
        }),
        PaymentStatus::Succeeded => Ok(StatusTransition::Succeeded {
            intent_id: intent_id()?,
        }),
        _ => Ok(StatusTransition::None),
    }
}

/// Major-unit rendering of a minor-unit amount, e.g. `12.00 USD`.
pub fn format_amount(minor: i64, currency: &str) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let minor = minor.abs();
    format!(
        "{}{}.{:02} {}",
        sign,
        minor / 100,
        minor % 100,
        currency.to_uppercase()
    )
}

/// Receipt details read from a succeeded payment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledPayment {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

impl SettledPayment {
    pub fn from_document(doc: &Document) -> Result<Self, ValidationError> {
        decode("payment intent", doc)
    }
}

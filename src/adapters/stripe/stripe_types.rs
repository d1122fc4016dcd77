//! Stripe wire types and form-encoded request bodies.
//!
//! Stripe takes `application/x-www-form-urlencoded` bodies with nested
//! keys written as `parent[child][grandchild]=value`.

use serde::Deserialize;

use crate::domain::payment_method::CardExpiry;
use crate::ports::{CreateConnectedAccountRequest, CreateCustomerRequest, CreatePaymentIntentRequest};

/// Ordered form parameters for one Stripe request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams(Vec<(String, String)>);

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    pub fn push_opt(&mut self, key: impl Into<String>, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Stripe error envelope: `{"error": {"type": ..., "code": ..., "message": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `DELETE /v1/customers/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeDeletedObject {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSetupIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

pub fn customer_params(request: &CreateCustomerRequest) -> FormParams {
    let mut params = FormParams::new();
    params.push_opt("email", request.email.as_deref());
    for (key, value) in &request.metadata {
        params.push(format!("metadata[{}]", key), value);
    }
    params
}

pub fn default_payment_method_params(payment_method_id: &str) -> FormParams {
    let mut params = FormParams::new();
    params.push("invoice_settings[default_payment_method]", payment_method_id);
    params
}

pub fn expiry_params(expiry: CardExpiry) -> FormParams {
    let mut params = FormParams::new();
    params
        .push("card[exp_month]", expiry.month)
        .push("card[exp_year]", expiry.year);
    params
}

pub fn payment_intent_params(request: &CreatePaymentIntentRequest) -> FormParams {
    let mut params = FormParams::new();
    params
        .push("amount", request.amount)
        .push("currency", &request.currency)
        .push("customer", &request.customer_id)
        .push("payment_method_data[type]", "card")
        .push("payment_method_data[card][token]", &request.card_token)
        .push("confirm", request.confirm)
        .push("off_session", request.off_session)
        .push_opt("receipt_email", request.receipt_email.as_deref());
    if let Some(transfer) = &request.transfer {
        params
            .push("transfer_data[amount]", transfer.amount)
            .push("transfer_data[destination]", &transfer.destination);
    }
    params
}

pub fn connected_account_params(request: &CreateConnectedAccountRequest) -> FormParams {
    let individual = &request.individual;
    let mut params = FormParams::new();
    params
        .push("type", "custom")
        .push("country", &request.country)
        .push("email", &request.email)
        .push("business_type", &request.business_type)
        .push("individual[email]", &individual.email)
        .push("individual[first_name]", &individual.first_name)
        .push("individual[last_name]", &individual.last_name)
        .push("individual[ssn_last_4]", &individual.ssn_last_4)
        .push_opt("individual[phone]", individual.phone.as_deref())
        .push("individual[address][city]", &individual.address.city)
        .push("individual[address][country]", &individual.address.country)
        .push("individual[address][line1]", &individual.address.line1)
        .push("individual[address][postal_code]", &individual.address.postal_code)
        .push("individual[address][state]", &individual.address.state)
        .push("individual[dob][day]", individual.dob.day)
        .push("individual[dob][month]", individual.dob.month)
        .push("individual[dob][year]", individual.dob.year)
        .push("business_profile[mcc]", &request.business_profile.mcc)
        .push("business_profile[url]", &request.business_profile.url)
        .push(
            "business_profile[product_description]",
            &request.business_profile.product_description,
        );
    for capability in &request.capabilities {
        params.push(format!("capabilities[{}][requested]", capability), true);
    }
    params
        .push("tos_acceptance[date]", request.tos_acceptance.date)
        .push("tos_acceptance[ip]", &request.tos_acceptance.ip);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        Address, BirthDate, BusinessProfile, Individual, TosAcceptance, TransferData,
    };

    fn intent_request() -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            amount: 1200,
            currency: "usd".into(),
            customer_id: "cus_1".into(),
            card_token: "tok_1".into(),
            receipt_email: Some("a@x.com".into()),
            transfer: Some(TransferData {
                amount: 1000,
                destination: "acct_1".into(),
            }),
            confirm: true,
            off_session: false,
            idempotency_key: "p1".into(),
        }
    }

    #[test]
    fn payment_intent_body_carries_split_and_card_token() {
        let params = payment_intent_params(&intent_request());
        assert_eq!(params.get("amount"), Some("1200"));
        assert_eq!(params.get("payment_method_data[type]"), Some("card"));
        assert_eq!(params.get("payment_method_data[card][token]"), Some("tok_1"));
        assert_eq!(params.get("confirm"), Some("true"));
        assert_eq!(params.get("off_session"), Some("false"));
        assert_eq!(params.get("transfer_data[amount]"), Some("1000"));
        assert_eq!(params.get("transfer_data[destination]"), Some("acct_1"));
        assert_eq!(params.get("receipt_email"), Some("a@x.com"));
    }

    #[test]
    fn payment_intent_body_omits_missing_split() {
        let mut request = intent_request();
        request.transfer = None;
        request.receipt_email = None;
        let params = payment_intent_params(&request);
        assert_eq!(params.get("transfer_data[amount]"), None);
        assert_eq!(params.get("receipt_email"), None);
    }

    #[test]
    fn idempotency_key_is_not_a_form_field() {
        let params = payment_intent_params(&intent_request());
        assert!(params.pairs().iter().all(|(k, _)| !k.contains("idempotency")));
    }

    #[test]
    fn customer_body_nests_metadata() {
        let request = CreateCustomerRequest::for_user("u1", Some("a@x.com".into()));
        let params = customer_params(&request);
        assert_eq!(params.get("email"), Some("a@x.com"));
        assert_eq!(params.get("metadata[user_id]"), Some("u1"));
    }

    #[test]
    fn connected_account_body() {
        let request = CreateConnectedAccountRequest {
            country: "US".into(),
            email: "chef@x.com".into(),
            business_type: "individual".into(),
            individual: Individual {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "chef@x.com".into(),
                phone: None,
                ssn_last_4: "1234".into(),
                address: Address {
                    city: "Austin".into(),
                    country: "US".into(),
                    line1: "1 Main St".into(),
                    postal_code: "73301".into(),
                    state: "TX".into(),
                },
                dob: BirthDate {
                    day: 10,
                    month: 12,
                    year: 1990,
                },
            },
            business_profile: BusinessProfile {
                mcc: "5734".into(),
                url: "https://lidora.app".into(),
                product_description: "Home cooked meals".into(),
            },
            capabilities: vec!["card_payments".into(), "transfers".into()],
            tos_acceptance: TosAcceptance {
                date: 1_700_000_000,
                ip: "203.0.113.7".into(),
            },
        };
        let params = connected_account_params(&request);
        assert_eq!(params.get("type"), Some("custom"));
        assert_eq!(params.get("individual[dob][month]"), Some("12"));
        assert_eq!(params.get("individual[phone]"), None);
        assert_eq!(params.get("capabilities[transfers][requested]"), Some("true"));
        assert_eq!(params.get("tos_acceptance[date]"), Some("1700000000"));
        assert_eq!(params.get("business_profile[mcc]"), Some("5734"));
    }

    #[test]
    fn expiry_body() {
        let params = expiry_params(CardExpiry { month: 5, year: 2031 });
        assert_eq!(params.get("card[exp_month]"), Some("5"));
        assert_eq!(params.get("card[exp_year]"), Some("2031"));
    }

    #[test]
    fn parses_error_envelope() {
        let body: StripeErrorBody = serde_json::from_str(
            r#"{"error": {"type": "card_error", "code": "card_declined", "message": "Your card was declined."}}"#,
        )
        .unwrap();
        assert_eq!(body.error.error_type.as_deref(), Some("card_error"));
        assert_eq!(body.error.code.as_deref(), Some("card_declined"));
    }
}

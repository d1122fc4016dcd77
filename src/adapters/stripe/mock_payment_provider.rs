//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Idempotent payment intent creation keyed like the real API
//! - Error injection (next call or per method)
//! - Call tracking
//! - Configurable intent statuses for create and confirm

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::foundation::Document;
use crate::domain::payment_method::CardExpiry;
use crate::ports::{
    CardDetails, ConnectedAccount, CreateConnectedAccountRequest, CreateCustomerRequest,
    CreatePaymentIntentRequest, Customer, ExternalAccount, PaymentError, PaymentIntent,
    PaymentMethod, PaymentProvider, SetupIntent,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
///
/// // Inject errors
/// mock.set_method_error("create_payment_intent", PaymentError::rejected("card_error", "Declined"));
///
/// // Assert on calls
/// assert_eq!(mock.call_count("confirm_payment_intent"), 1);
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    customers: HashMap<String, Customer>,
    default_methods: HashMap<String, String>,
    payment_methods: HashMap<String, PaymentMethod>,

    /// Intents by id.
    intents: HashMap<String, PaymentIntent>,

    /// First response by idempotency key, replayed verbatim.
    idempotency: HashMap<String, PaymentIntent>,

    /// Status new intents are created in (default `succeeded`).
    create_status: Option<String>,

    /// Status confirmed intents move to (default `succeeded`).
    confirm_status: Option<String>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    sequence: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}_mock_{}", prefix, self.sequence)
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Make new intents come back in `status` (e.g. `requires_confirmation`).
    pub fn set_create_status(&self, status: &str) {
        self.inner.lock().unwrap().create_status = Some(status.to_string());
    }

    /// Make confirmed intents come back in `status`.
    pub fn set_confirm_status(&self, status: &str) {
        self.inner.lock().unwrap().confirm_status = Some(status.to_string());
    }

    /// Register a card the client saved (as the provider-side method).
    pub fn add_card(&self, payment_method_id: &str, brand: &str, last4: &str, month: u32, year: i32) {
        self.inner.lock().unwrap().payment_methods.insert(
            payment_method_id.to_string(),
            PaymentMethod {
                id: payment_method_id.to_string(),
                customer: None,
                card: Some(CardDetails {
                    brand: brand.to_string(),
                    last4: last4.to_string(),
                    exp_month: month,
                    exp_year: year,
                }),
            },
        );
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Calls to one method, in order.
    pub fn calls_to(&self, method: &str) -> Vec<MethodCall> {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    /// Distinct payment intents created so far.
    pub fn intents(&self) -> Vec<PaymentIntent> {
        let mut intents: Vec<_> = self.inner.lock().unwrap().intents.values().cloned().collect();
        intents.sort_by(|a, b| a.id.cmp(&b.id));
        intents
    }

    pub fn has_customer(&self, customer_id: &str) -> bool {
        self.inner.lock().unwrap().customers.contains_key(customer_id)
    }

    pub fn default_payment_method(&self, customer_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .default_methods
            .get(customer_id)
            .cloned()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.inner.lock().unwrap();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    fn begin(&self, method: &str, args: Vec<String>) -> Result<(), PaymentError> {
        self.record_call(method, args);
        self.check_error(method)
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn no_such(kind: &str, id: &str) -> PaymentError {
    PaymentError::Rejected {
        category: "invalid_request_error".to_string(),
        code: Some("resource_missing".to_string()),
        message: format!("No such {}: '{}'", kind, id),
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.begin(
            "create_customer",
            vec![request.email.clone().unwrap_or_default()],
        )?;

        let mut state = self.inner.lock().unwrap();
        let customer = Customer {
            id: state.next_id("cus"),
            email: request.email,
        };
        state.customers.insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), PaymentError> {
        self.begin("delete_customer", vec![customer_id.to_string()])?;

        let mut state = self.inner.lock().unwrap();
        state
            .customers
            .remove(customer_id)
            .ok_or_else(|| no_such("customer", customer_id))?;
        state.default_methods.remove(customer_id);
        for method in state.payment_methods.values_mut() {
            if method.customer.as_deref() == Some(customer_id) {
                method.customer = None;
            }
        }
        Ok(())
    }

    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), PaymentError> {
        self.begin(
            "set_default_payment_method",
            vec![customer_id.to_string(), payment_method_id.to_string()],
        )?;

        let mut state = self.inner.lock().unwrap();
        if !state.customers.contains_key(customer_id) {
            return Err(no_such("customer", customer_id));
        }
        state
            .default_methods
            .insert(customer_id.to_string(), payment_method_id.to_string());
        Ok(())
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError> {
        self.begin("create_setup_intent", vec![customer_id.to_string()])?;

        let mut state = self.inner.lock().unwrap();
        let id = state.next_id("seti");
        Ok(SetupIntent {
            client_secret: format!("{}_secret", id),
            id,
        })
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        self.begin(
            "attach_payment_method",
            vec![payment_method_id.to_string(), customer_id.to_string()],
        )?;

        let mut state = self.inner.lock().unwrap();
        let method = state
            .payment_methods
            .entry(payment_method_id.to_string())
            .or_insert_with(|| PaymentMethod {
                id: payment_method_id.to_string(),
                customer: None,
                card: Some(CardDetails {
                    brand: "visa".to_string(),
                    last4: "4242".to_string(),
                    exp_month: 12,
                    exp_year: 2030,
                }),
            });
        method.customer = Some(customer_id.to_string());
        Ok(method.clone())
    }

    async fn retrieve_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        self.begin("retrieve_payment_method", vec![payment_method_id.to_string()])?;

        let state = self.inner.lock().unwrap();
        state
            .payment_methods
            .get(payment_method_id)
            .cloned()
            .ok_or_else(|| no_such("payment_method", payment_method_id))
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<(), PaymentError> {
        self.begin("detach_payment_method", vec![payment_method_id.to_string()])?;

        let mut state = self.inner.lock().unwrap();
        let method = state
            .payment_methods
            .get_mut(payment_method_id)
            .ok_or_else(|| no_such("payment_method", payment_method_id))?;
        if method.customer.take().is_none() {
            return Err(PaymentError::Rejected {
                category: "invalid_request_error".to_string(),
                code: None,
                message: "The payment method you provided is not attached to a customer so detachment is impossible.".to_string(),
            });
        }
        Ok(())
    }

    async fn update_payment_method_expiry(
        &self,
        payment_method_id: &str,
        expiry: CardExpiry,
    ) -> Result<PaymentMethod, PaymentError> {
        self.begin(
            "update_payment_method_expiry",
            vec![
                payment_method_id.to_string(),
                expiry.month.to_string(),
                expiry.year.to_string(),
            ],
        )?;

        let mut state = self.inner.lock().unwrap();
        let method = state
            .payment_methods
            .get_mut(payment_method_id)
            .ok_or_else(|| no_such("payment_method", payment_method_id))?;
        if let Some(card) = method.card.as_mut() {
            card.exp_month = expiry.month;
            card.exp_year = expiry.year;
        }
        Ok(method.clone())
    }

    async fn create_connected_account(
        &self,
        request: CreateConnectedAccountRequest,
    ) -> Result<ConnectedAccount, PaymentError> {
        self.begin(
            "create_connected_account",
            vec![request.email.clone(), request.tos_acceptance.ip.clone()],
        )?;

        let mut state = self.inner.lock().unwrap();
        let mut extra = Document::new();
        extra.insert("object".into(), json!("account"));
        extra.insert("type".into(), json!("custom"));
        extra.insert("email".into(), json!(request.email));
        Ok(ConnectedAccount {
            id: state.next_id("acct"),
            extra,
        })
    }

    async fn create_external_account(
        &self,
        account_id: &str,
        token: &str,
    ) -> Result<ExternalAccount, PaymentError> {
        self.begin(
            "create_external_account",
            vec![account_id.to_string(), token.to_string()],
        )?;

        let mut state = self.inner.lock().unwrap();
        let mut extra = Document::new();
        extra.insert("object".into(), json!("bank_account"));
        extra.insert("account".into(), json!(account_id));
        extra.insert("last4".into(), json!("6789"));
        Ok(ExternalAccount {
            id: state.next_id("ba"),
            extra,
        })
    }

    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.begin(
            "create_payment_intent",
            vec![
                request.idempotency_key.clone(),
                request.amount.to_string(),
                request.customer_id.clone(),
            ],
        )?;

        let mut state = self.inner.lock().unwrap();
        if let Some(original) = state.idempotency.get(&request.idempotency_key) {
            return Ok(original.clone());
        }

        let id = state.next_id("pi");
        let status = state
            .create_status
            .clone()
            .unwrap_or_else(|| "succeeded".to_string());
        let mut extra = Document::new();
        extra.insert("object".into(), json!("payment_intent"));
        extra.insert("customer".into(), json!(request.customer_id));
        extra.insert("client_secret".into(), json!(format!("{}_secret", id)));
        extra.insert("receipt_email".into(), json!(request.receipt_email));
        let intent = PaymentIntent {
            id: id.clone(),
            status,
            amount: request.amount,
            currency: request.currency,
            transfer_data: request.transfer,
            extra,
        };
        state.intents.insert(id, intent.clone());
        state
            .idempotency
            .insert(request.idempotency_key, intent.clone());
        Ok(intent)
    }

    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.begin("confirm_payment_intent", vec![intent_id.to_string()])?;

        let mut state = self.inner.lock().unwrap();
        let status = state
            .confirm_status
            .clone()
            .unwrap_or_else(|| "succeeded".to_string());
        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| no_such("payment_intent", intent_id))?;
        intent.status = status;
        Ok(intent.clone())
    }
}

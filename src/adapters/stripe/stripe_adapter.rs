//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port over the Stripe REST API with
//! `reqwest`. Every request authenticates with the secret key as the basic
//! auth user and pins the API version with the `Stripe-Version` header.
//!
//! # Errors
//!
//! - Error bodies carrying a `type` become `PaymentError::Rejected`; their
//!   message is shown to users.
//! - Transport failures become `PaymentError::Network`.
//! - Anything else (untyped error bodies, unparseable responses) becomes
//!   `PaymentError::Unexpected`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_api_version("2020-03-02");
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::payment_method::CardExpiry;
use crate::ports::{
    ConnectedAccount, CreateConnectedAccountRequest, CreateCustomerRequest,
    CreatePaymentIntentRequest, Customer, ExternalAccount, PaymentError, PaymentIntent,
    PaymentMethod, PaymentProvider, SetupIntent,
};

use super::stripe_types::{
    connected_account_params, customer_params, default_payment_method_params, expiry_params,
    payment_intent_params, FormParams, StripeDeletedObject, StripeErrorBody, StripeSetupIntent,
};

/// API version the document shapes were written against.
pub const DEFAULT_API_VERSION: &str = "2020-03-02";

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Value of the `Stripe-Version` header.
    api_version: String,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .header("Stripe-Version", &self.config.api_version)
    }

    fn post(&self, path: &str, params: &FormParams) -> RequestBuilder {
        self.request(Method::POST, path).form(params.pairs())
    }

    /// Send a request and decode the success body.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, PaymentError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(operation, error = %e, "Stripe request failed to send");
            PaymentError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if !status.is_success() {
            let error = error_from_response(status, &body);
            tracing::warn!(
                operation,
                status = status.as_u16(),
                error = %error,
                "Stripe request rejected"
            );
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Unexpected(format!("failed to parse {} response: {}", operation, e))
        })
    }
}

/// Map a non-2xx Stripe response onto `PaymentError`.
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> PaymentError {
    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(StripeErrorBody { error }) => match error.error_type {
            Some(category) => PaymentError::Rejected {
                category,
                code: error.code,
                message: error
                    .message
                    .unwrap_or_else(|| format!("Stripe returned {}", status)),
            },
            None => PaymentError::Unexpected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error.message.unwrap_or_default()
            )),
        },
        Err(_) => PaymentError::Unexpected(format!("HTTP {}: {}", status.as_u16(), body)),
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let params = customer_params(&request);
        self.send("create_customer", self.post("customers", &params))
            .await
    }

    async fn delete_customer(&self, customer_id: &str) -> Result<(), PaymentError> {
        let deleted: StripeDeletedObject = self
            .send(
                "delete_customer",
                self.request(Method::DELETE, &format!("customers/{}", customer_id)),
            )
            .await?;
        if !deleted.deleted {
            return Err(PaymentError::Unexpected(format!(
                "customer {} was not deleted",
                deleted.id
            )));
        }
        Ok(())
    }

    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), PaymentError> {
        let params = default_payment_method_params(payment_method_id);
        let _: Customer = self
            .send(
                "set_default_payment_method",
                self.post(&format!("customers/{}", customer_id), &params),
            )
            .await?;
        Ok(())
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError> {
        let mut params = FormParams::new();
        params.push("customer", customer_id);
        let intent: StripeSetupIntent = self
            .send("create_setup_intent", self.post("setup_intents", &params))
            .await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::Unexpected(format!("setup intent {} has no client secret", intent.id))
        })?;
        Ok(SetupIntent {
            id: intent.id,
            client_secret,
        })
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        let mut params = FormParams::new();
        params.push("customer", customer_id);
        self.send(
            "attach_payment_method",
            self.post(&format!("payment_methods/{}/attach", payment_method_id), &params),
        )
        .await
    }

    async fn retrieve_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, PaymentError> {
        self.send(
            "retrieve_payment_method",
            self.request(Method::GET, &format!("payment_methods/{}", payment_method_id)),
        )
        .await
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<(), PaymentError> {
        let _: PaymentMethod = self
            .send(
                "detach_payment_method",
                self.post(
                    &format!("payment_methods/{}/detach", payment_method_id),
                    &FormParams::new(),
                ),
            )
            .await?;
        Ok(())
    }

    async fn update_payment_method_expiry(
        &self,
        payment_method_id: &str,
        expiry: CardExpiry,
    ) -> Result<PaymentMethod, PaymentError> {
        let params = expiry_params(expiry);
        self.send(
            "update_payment_method_expiry",
            self.post(&format!("payment_methods/{}", payment_method_id), &params),
        )
        .await
    }

    async fn create_connected_account(
        &self,
        request: CreateConnectedAccountRequest,
    ) -> Result<ConnectedAccount, PaymentError> {
        let params = connected_account_params(&request);
        self.send("create_connected_account", self.post("accounts", &params))
            .await
    }

    async fn create_external_account(
        &self,
        account_id: &str,
        token: &str,
    ) -> Result<ExternalAccount, PaymentError> {
        let mut params = FormParams::new();
        params.push("external_account", token);
        self.send(
            "create_external_account",
            self.post(&format!("accounts/{}/external_accounts", account_id), &params),
        )
        .await
    }

    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let params = payment_intent_params(&request);
        let builder = self
            .post("payment_intents", &params)
            .header("Idempotency-Key", &request.idempotency_key);
        self.send("create_payment_intent", builder).await
    }

    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.send(
            "confirm_payment_intent",
            self.post(
                &format!("payment_intents/{}/confirm", intent_id),
                &FormParams::new(),
            ),
        )
        .await
    }
}

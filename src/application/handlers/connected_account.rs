//! Merchant payouts: custom connected accounts for chefs and the bank
//! accounts attached to them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::DocumentTrigger;
use crate::application::error::HandlerError;
use crate::application::failure::{FailureContext, FailureRecorder};
use crate::config::AccountProfileConfig;
use crate::domain::chef::{chef_path, require_account_id, ChefProfile};
use crate::domain::foundation::{field, str_field, PathParams};
use crate::domain::trigger::DocumentEvent;
use crate::ports::{
    Address, BirthDate, BusinessProfile, CreateConnectedAccountRequest, DocumentStore, Individual,
    PaymentProvider, TosAcceptance,
};

const USER_ID: &str = "userId";

/// Capabilities requested for every chef account.
const CAPABILITIES: [&str; 2] = ["card_payments", "transfers"];

/// Account request for `profile`, accepting the terms of service at
/// `accepted_at` (Unix seconds).
pub fn account_request(
    profile: &ChefProfile,
    business: &AccountProfileConfig,
    accepted_at: i64,
) -> CreateConnectedAccountRequest {
    CreateConnectedAccountRequest {
        country: business.country.clone(),
        email: profile.email_address.clone(),
        business_type: "individual".to_string(),
        individual: Individual {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email_address.clone(),
            phone: profile.phone.clone(),
            ssn_last_4: profile.ssn_last_4.clone(),
            address: Address {
                city: profile.city.clone(),
                country: business.country.clone(),
                line1: profile.line1.clone(),
                postal_code: profile.postal_code.clone(),
                state: profile.state.clone(),
            },
            dob: BirthDate {
                day: profile.dob.day,
                month: profile.dob.month,
                year: profile.dob.year,
            },
        },
        business_profile: BusinessProfile {
            mcc: business.mcc.clone(),
            url: business.url.clone(),
            product_description: business.product_description.clone(),
        },
        capabilities: CAPABILITIES.iter().map(|c| c.to_string()).collect(),
        tos_acceptance: TosAcceptance {
            date: accepted_at,
            ip: profile.ip.clone(),
        },
    }
}

/// Opens a custom connected account for a new chef.
pub struct CreateConnectedAccount {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    business: AccountProfileConfig,
    failures: FailureRecorder,
}

impl CreateConnectedAccount {
    pub const NAME: &'static str = "create_connected_account";

    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        business: AccountProfileConfig,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            store,
            payments,
            business,
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent) -> Result<(), HandlerError> {
        let profile = ChefProfile::from_document(&event.current())?;
        let request = account_request(&profile, &self.business, Utc::now().timestamp());
        let account = self.payments.create_connected_account(request).await?;
        self.store
            .merge(&event.path, field("account_id", json!(account.id)))
            .await?;
        tracing::info!(chef = event.path.id(), account_id = %account.id, "Connected account created");
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for CreateConnectedAccount {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent, params: PathParams) {
        if let Err(error) = self.run(&event).await {
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        user: params.get(USER_ID),
                        annotate: Some(&event.path),
                        document: Some(&event.path),
                        annotate_existing: false,
                    },
                )
                .await;
        }
    }
}

/// Attaches a bank account or debit card token to a chef's account.
pub struct AttachExternalAccount {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    failures: FailureRecorder,
}

impl AttachExternalAccount {
    pub const NAME: &'static str = "attach_external_account";

    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        failures: FailureRecorder,
    ) -> Self {
        Self {
            store,
            payments,
            failures,
        }
    }

    async fn run(&self, event: &DocumentEvent, params: &PathParams) -> Result<(), HandlerError> {
        let uid = params.require(USER_ID)?;
        let current = event.current();
        let token = str_field(&current, "token").unwrap_or_else(|| event.path.id());

        let chef = chef_path(uid);
        let chef_doc = self
            .store
            .get(&chef)
            .await?
            .ok_or_else(|| HandlerError::not_found("chef", &chef))?;
        let account_id = require_account_id(&chef_doc)?;

        let external = self
            .payments
            .create_external_account(&account_id, token)
            .await?;
        self.store
            .merge(&event.path, external.to_document()?)
            .await?;
        tracing::info!(chef = uid, external_account = %external.id, "External account attached");
        Ok(())
    }
}

#[async_trait]
impl DocumentTrigger for AttachExternalAccount {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent, params: PathParams) {
        if let Err(error) = self.run(&event, &params).await {
            self.failures
                .record(
                    Self::NAME,
                    &error,
                    FailureContext {
                        user: params.get(USER_ID),
                        annotate: Some(&event.path),
                        document: Some(&event.path),
                        annotate_existing: false,
                    },
                )
                .await;
        }
    }
}

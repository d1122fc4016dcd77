//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    pub stripe_api_key: String,

    /// Pinned `Stripe-Version`
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Override for the Stripe API base URL (stripe-mock, tests)
    pub api_base_url: Option<String>,

    /// Connected account that receives the `subtotal` split when the
    /// payment document names no `destination`
    pub default_transfer_destination: Option<String>,

    /// Business profile sent when creating merchant accounts
    #[serde(default)]
    pub account_profile: AccountProfileConfig,
}

/// Business profile defaults for custom connected accounts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccountProfileConfig {
    #[serde(default = "default_country")]
    pub country: String,

    /// Merchant category code
    #[serde(default = "default_mcc")]
    pub mcc: String,

    #[serde(default = "default_business_url")]
    pub url: String,

    #[serde(default = "default_product_description")]
    pub product_description: String,
}

impl Default for AccountProfileConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            mcc: default_mcc(),
            url: default_business_url(),
            product_description: default_product_description(),
        }
    }
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if !self.stripe_api_key.starts_with("sk_") && !self.stripe_api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !is_api_version(&self.api_version) {
            return Err(ValidationError::InvalidStripeVersion(self.api_version.clone()));
        }
        if let Some(destination) = &self.default_transfer_destination {
            if !destination.starts_with("acct_") {
                return Err(ValidationError::InvalidAccountId(destination.clone()));
            }
        }
        let mcc = &self.account_profile.mcc;
        if mcc.len() != 4 || !mcc.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidMcc(mcc.clone()));
        }
        Ok(())
    }
}

/// `YYYY-MM-DD`, optionally followed by a `.release` suffix.
fn is_api_version(raw: &str) -> bool {
    let date = raw.split('.').next().unwrap_or_default();
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn default_api_version() -> String {
    "2020-03-02".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

fn default_mcc() -> String {
    "5734".to_string()
}

fn default_business_url() -> String {
    "https://instagram.com/lidora".to_string()
}

fn default_product_description() -> String {
    "Home-cooked meals sold through Lidora".to_string()
}

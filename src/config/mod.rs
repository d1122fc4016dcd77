//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `LIDORA` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use lidora_functions::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod email;
mod error;
mod gcp;
mod notification;
mod payment;
mod server;

pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use gcp::GcpConfig;
pub use notification::NotificationConfig;
pub use payment::{AccountProfileConfig, PaymentConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables,
/// then call [`AppConfig::validate()`] once before building adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, trigger signing)
    #[serde(default)]
    pub server: ServerConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,

    /// Email configuration (SMTP)
    pub email: EmailConfig,

    /// Push notification configuration (FCM)
    pub notification: NotificationConfig,

    /// Google Cloud configuration (Firestore, Cloud Logging)
    pub gcp: GcpConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LIDORA` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `LIDORA__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LIDORA__PAYMENT__STRIPE_API_KEY=...` -> `payment.stripe_api_key = ...`
    /// - `LIDORA__PAYMENT__ACCOUNT_PROFILE__MCC=5734` -> `payment.account_profile.mcc`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LIDORA")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.payment.validate()?;
        self.email.validate()?;
        self.notification.validate()?;
        self.gcp.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

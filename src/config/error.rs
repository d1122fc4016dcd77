//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Trigger signing secret must be at least 32 characters")]
    WeakSigningSecret,

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Invalid Stripe API version {0}")]
    InvalidStripeVersion(String),

    #[error("Invalid Stripe account id {0}")]
    InvalidAccountId(String),

    #[error("Invalid merchant category code {0}")]
    InvalidMcc(String),

    #[error("Invalid email address for {0}")]
    InvalidEmail(&'static str),

    #[error("Firestore emulator host must be host:port")]
    InvalidEmulatorHost,
}

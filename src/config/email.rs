//! Email configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (SMTP)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub smtp_username: Option<String>,

    pub smtp_password: Option<String>,

    /// Use STARTTLS (disable only for local relays)
    #[serde(default = "default_starttls")]
    pub starttls: bool,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Operator inbox that receives lead notifications
    pub operator_address: String,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.smtp_host.is_empty() {
            return Err(ValidationError::MissingRequired("SMTP_HOST"));
        }
        if self.smtp_port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.smtp_username.is_some() != self.smtp_password.is_some() {
            return Err(ValidationError::MissingRequired("SMTP_USERNAME and SMTP_PASSWORD"));
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidEmail("from_email"));
        }
        if !self.operator_address.contains('@') {
            return Err(ValidationError::InvalidEmail("operator_address"));
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            starttls: default_starttls(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            operator_address: String::new(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

fn default_from_email() -> String {
    "noreply@lidora.app".to_string()
}

fn default_from_name() -> String {
    "Lidora".to_string()
}

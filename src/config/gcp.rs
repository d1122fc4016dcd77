//! Google Cloud configuration (Firestore, Cloud Logging)

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct GcpConfig {
    pub project_id: String,

    /// `host:port` of the Firestore emulator; no credentials are sent
    pub firestore_emulator_host: Option<String>,

    /// Static OAuth access token; the metadata server is used when unset
    pub access_token: Option<String>,

    /// Name error reports are filed under
    #[serde(default = "default_function_name")]
    pub function_name: String,
}

impl GcpConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_id.is_empty() {
            return Err(ValidationError::MissingRequired("GCP_PROJECT_ID"));
        }
        if let Some(host) = &self.firestore_emulator_host {
            let valid = host
                .rsplit_once(':')
                .map(|(name, port)| !name.is_empty() && port.parse::<u16>().is_ok())
                .unwrap_or(false);
            if !valid {
                return Err(ValidationError::InvalidEmulatorHost);
            }
        }
        Ok(())
    }
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            firestore_emulator_host: None,
            access_token: None,
            function_name: default_function_name(),
        }
    }
}

fn default_function_name() -> String {
    "lidora-functions".to_string()
}

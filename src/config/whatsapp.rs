//! WhatsApp Cloud API configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::whatsapp::{WhatsAppConfig, DEFAULT_GRAPH_API_URL, DEFAULT_GRAPH_API_VERSION};

/// WhatsApp Cloud API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppSettings {
    /// Shared secret for the webhook handshake and `/trigger`
    pub verify_token: Secret<String>,

    /// Graph API bearer token
    pub access_token: Secret<String>,

    /// Business phone number id messages are sent from
    pub phone_number_id: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl WhatsAppSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.verify_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("WHATSAPP__VERIFY_TOKEN"));
        }
        if self.access_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("WHATSAPP__ACCESS_TOKEN"));
        }
        if self.phone_number_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("WHATSAPP__PHONE_NUMBER_ID"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("whatsapp.api_base_url"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }

    /// Client configuration for the Cloud API adapter.
    pub fn client_config(&self) -> WhatsAppConfig {
        WhatsAppConfig::new(self.access_token.expose_secret().clone(), self.phone_number_id.clone())
            .with_api_base_url(self.api_base_url.clone())
            .with_api_version(self.api_version.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn default_api_base_url() -> String {
    DEFAULT_GRAPH_API_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_GRAPH_API_VERSION.to_string()
}

fn default_timeout() -> u64 {
    30
}

//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SHEET_COURIER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use sheet_courier::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod conversation;
mod error;
mod pipeline;
mod server;
mod sheets;
mod whatsapp;

pub use conversation::ConversationConfig;
pub use error::{ConfigError, ValidationError};
pub use pipeline::PipelineConfig;
pub use server::{Environment, LogFormat, ServerConfig};
pub use sheets::SheetsConfig;
pub use whatsapp::WhatsAppSettings;

use serde::Deserialize;

use crate::application::PipelineSettings;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials and endpoints
    pub whatsapp: WhatsAppSettings,

    /// Spreadsheet, input cell and export layout
    pub sheets: SheetsConfig,

    /// Delivery format, scratch space and step timeout
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Start command, session lifetime and reply texts
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SHEET_COURIER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SHEET_COURIER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SHEET_COURIER__WHATSAPP__VERIFY_TOKEN=...` -> `whatsapp.verify_token = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values cannot
    /// be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SHEET_COURIER")
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
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.whatsapp.validate()?;
        self.sheets.validate()?;
        self.pipeline.validate()?;
        self.conversation.validate()?;
        Ok(())
    }

    /// Settings for the document pipeline, drawn from the sheets and pipeline sections.
    pub fn pipeline_settings(&self) -> Result<PipelineSettings, ValidationError> {
        Ok(PipelineSettings {
            input_cell: self.sheets.input_cell()?,
            region: self.sheets.export_region()?,
            layout: self.sheets.page_layout()?,
            delivery_format: self.pipeline.delivery_format,
            step_timeout: self.pipeline.step_timeout(),
        })
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{DocumentFormat, Orientation};
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "SHEET_COURIER__WHATSAPP__VERIFY_TOKEN",
        "SHEET_COURIER__WHATSAPP__ACCESS_TOKEN",
        "SHEET_COURIER__WHATSAPP__PHONE_NUMBER_ID",
        "SHEET_COURIER__SHEETS__SPREADSHEET_ID",
        "SHEET_COURIER__SHEETS__CREDENTIALS_PATH",
        "SHEET_COURIER__SHEETS__ORIENTATION",
        "SHEET_COURIER__SERVER__PORT",
        "SHEET_COURIER__SERVER__ENVIRONMENT",
        "SHEET_COURIER__PIPELINE__DELIVERY_FORMAT",
        "SHEET_COURIER__CONVERSATION__START_COMMAND",
    ];

    fn set_minimal_env() {
        env::set_var("SHEET_COURIER__WHATSAPP__VERIFY_TOKEN", "verify-me");
        env::set_var("SHEET_COURIER__WHATSAPP__ACCESS_TOKEN", "EAAGtoken");
        env::set_var("SHEET_COURIER__WHATSAPP__PHONE_NUMBER_ID", "106540352242922");
        env::set_var("SHEET_COURIER__SHEETS__SPREADSHEET_ID", "1AbCdEf");
        env::set_var("SHEET_COURIER__SHEETS__CREDENTIALS_PATH", "/run/secrets/key.json");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.whatsapp.verify_token.expose_secret(), "verify-me");
        assert_eq!(config.whatsapp.phone_number_id, "106540352242922");
        assert_eq!(config.sheets.spreadsheet_id, "1AbCdEf");
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.pipeline.delivery_format, DocumentFormat::Png);
        assert_eq!(config.conversation.start_command, "/timetable");
        assert_eq!(config.conversation.session_ttl_secs, 600);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("SHEET_COURIER__SERVER__PORT", "3000");
        env::set_var("SHEET_COURIER__SERVER__ENVIRONMENT", "production");
        env::set_var("SHEET_COURIER__PIPELINE__DELIVERY_FORMAT", "pdf");
        env::set_var("SHEET_COURIER__SHEETS__ORIENTATION", "portrait");
        env::set_var("SHEET_COURIER__CONVERSATION__START_COMMAND", "/schedule");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.pipeline.delivery_format, DocumentFormat::Pdf);
        assert_eq!(config.sheets.orientation, Orientation::Portrait);
        assert_eq!(config.conversation.start_command, "/schedule");
    }

    #[test]
    fn test_missing_whatsapp_section_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("SHEET_COURIER__SHEETS__SPREADSHEET_ID", "1AbCdEf");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_pipeline_settings_combine_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let settings = result.unwrap().pipeline_settings().unwrap();
        assert_eq!(settings.input_cell.as_str(), "Sheet1!B2");
        assert_eq!(settings.region.sheet_gid, 0);
        assert_eq!(settings.step_timeout.as_secs(), 30);
    }
}

//! Conversation configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::{ConversationSettings, ConversationTexts};
use crate::domain::conversation::StartCommand;

/// Conversation flow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_start_command")]
    pub start_command: String,

    /// Name of the collected input, used in logs
    #[serde(default = "default_input_field")]
    pub input_field: String,

    /// Idle time after which an unanswered prompt is forgotten
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    pub prompt_text: Option<String>,
    pub help_text: Option<String>,
    pub failure_text: Option<String>,
    pub media_caption: Option<String>,
}

impl ConversationConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.settings()?;
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::invalid_value(
                "conversation.session_ttl_secs",
                "must be positive",
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::invalid_value(
                "conversation.sweep_interval_secs",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Orchestrator settings, with configured texts replacing the defaults.
    pub fn settings(&self) -> Result<ConversationSettings, ValidationError> {
        let start_command = StartCommand::new(&self.start_command).map_err(|e| {
            ValidationError::invalid_value("conversation.start_command", e.to_string())
        })?;
        if self.input_field.trim().is_empty() {
            return Err(ValidationError::MissingRequired("CONVERSATION__INPUT_FIELD"));
        }

        let defaults = ConversationTexts::default();
        let texts = ConversationTexts {
            prompt: non_blank(&self.prompt_text).unwrap_or(defaults.prompt),
            help: non_blank(&self.help_text).unwrap_or(defaults.help),
            failure: non_blank(&self.failure_text).unwrap_or(defaults.failure),
            media_caption: non_blank(&self.media_caption),
        };

        Ok(ConversationSettings {
            start_command,
            input_field: self.input_field.trim().to_string(),
            texts,
        })
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            start_command: default_start_command(),
            input_field: default_input_field(),
            session_ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            prompt_text: None,
            help_text: None,
            failure_text: None,
            media_caption: None,
        }
    }
}

fn non_blank(text: &Option<String>) -> Option<String> {
    text.as_ref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.to_string())
}

fn default_start_command() -> String {
    "/timetable".to_string()
}

fn default_input_field() -> String {
    "teacher_name".to_string()
}

fn default_session_ttl() -> u64 {
    600
}

fn default_sweep_interval() -> u64 {
    60
}

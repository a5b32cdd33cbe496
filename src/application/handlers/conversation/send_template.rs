//! SendTemplateHandler - Starts a business-initiated conversation.
//!
//! Outside the customer-care window the platform only accepts approved
//! templates, so outreach goes through here rather than `send_text`.

use thiserror::Error;

use crate::application::handlers::document::OutboundMessenger;
use crate::domain::conversation::DeliveryError;
use crate::domain::foundation::{SenderId, ValidationError};
use crate::ports::{SentMessage, TemplateMessage};

/// Language used when the command does not name one.
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "en_US";

/// Command to send an approved template to a recipient.
#[derive(Debug, Clone)]
pub struct SendTemplateCommand {
    pub to: String,
    pub template: String,
    pub language: Option<String>,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendTemplateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Handler for outbound template messages.
pub struct SendTemplateHandler {
    messenger: OutboundMessenger,
}

impl SendTemplateHandler {
    pub fn new(messenger: OutboundMessenger) -> Self {
        Self { messenger }
    }

    pub async fn handle(&self, cmd: SendTemplateCommand) -> Result<SentMessage, SendTemplateError> {
        let to = SenderId::new(cmd.to)?;
        let name = cmd.template.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("template").into());
        }
        let language = cmd
            .language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_TEMPLATE_LANGUAGE.to_string());

        let template = TemplateMessage {
            name: name.to_string(),
            language,
            parameters: cmd.parameters,
        };

        let sent = self.messenger.send_template(&to, template).await?;
        tracing::info!(
            to = %to.masked(),
            template = name,
            message_id = %sent.message_id,
            "Template sent"
        );
        Ok(sent)
    }
}

//! Messaging platform port for outbound delivery.
//!
//! Defines the contract for the chat platform the service talks through
//! (e.g., WhatsApp Cloud API). Media is delivered in two calls: upload the
//! bytes to obtain a reference, then send a message carrying the reference.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::SenderId;

/// Port for sending messages to a recipient.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    /// Upload media bytes and return the platform's reference to them.
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<MediaRef, MessagingError>;

    /// Send a text or media message to `to`.
    async fn send_message(
        &self,
        to: &SenderId,
        payload: OutboundPayload,
    ) -> Result<SentMessage, MessagingError>;

    /// Send a pre-approved template message.
    ///
    /// Templates are the only way to open a conversation the recipient has
    /// not messaged into recently.
    async fn send_template(
        &self,
        to: &SenderId,
        template: TemplateMessage,
    ) -> Result<SentMessage, MessagingError>;
}

/// Platform reference to uploaded media.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of one outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPayload {
    Text {
        body: String,
    },
    Image {
        media: MediaRef,
        caption: Option<String>,
    },
    Document {
        media: MediaRef,
        filename: String,
        caption: Option<String>,
    },
}

impl OutboundPayload {
    pub fn text(body: impl Into<String>) -> Self {
        OutboundPayload::Text { body: body.into() }
    }

    /// Platform message type name.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPayload::Text { .. } => "text",
            OutboundPayload::Image { .. } => "image",
            OutboundPayload::Document { .. } => "document",
        }
    }
}

/// Template message with positional body parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMessage {
    pub name: String,

    /// Language code, e.g. `en_US`.
    pub language: String,

    /// Values for `{{1}}`, `{{2}}`, ... in the template body.
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Platform message id (`wamid...`).
    pub message_id: String,
}

/// Errors from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    #[error("network error: {0}")]
    Network(String),

    #[error("platform rejected credentials: {0}")]
    Unauthorized(String),

    #[error("platform returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected platform response: {0}")]
    InvalidResponse(String),
}

impl MessagingError {
    pub fn network(message: impl Into<String>) -> Self {
        MessagingError::Network(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        MessagingError::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MessagingError::Network(_) => true,
            MessagingError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

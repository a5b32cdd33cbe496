//! Inbound messages as the orchestrator sees them.

use thiserror::Error;

use crate::domain::foundation::{SenderId, Timestamp, ValidationError};

/// One text message from a sender. Lives only for the duration of its handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: SenderId,
    pub text: String,
    pub received_at: Timestamp,
    /// Platform message id, for log correlation.
    pub message_id: Option<String>,
}

impl InboundMessage {
    /// Creates a message received now.
    pub fn new(sender_id: SenderId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            text: text.into(),
            received_at: Timestamp::now(),
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_received_at(mut self, received_at: Timestamp) -> Self {
        self.received_at = received_at;
        self
    }
}

/// A webhook entry that does not carry a usable text message.
///
/// Acknowledged to the platform and otherwise ignored; sessions are not touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPayload {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("message is missing field '{0}'")]
    MissingField(&'static str),

    #[error("message type '{0}' carries no text")]
    UnsupportedMessageType(String),

    #[error("invalid sender: {0}")]
    InvalidSender(#[from] ValidationError),
}

//! Conversation handlers.
//!
//! Handles inbound messages from senders and business-initiated templates.

mod handle_inbound;
mod send_template;

pub use handle_inbound::{
    ConversationOrchestrator, ConversationSettings, ConversationTexts, InboundOutcome,
};
pub use send_template::{
    SendTemplateCommand, SendTemplateError, SendTemplateHandler, DEFAULT_TEMPLATE_LANGUAGE,
};

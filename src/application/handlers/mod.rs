//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod conversation;
pub mod document;

pub use conversation::{
    ConversationOrchestrator, ConversationSettings, ConversationTexts, InboundOutcome,
    SendTemplateCommand, SendTemplateError, SendTemplateHandler, DEFAULT_TEMPLATE_LANGUAGE,
};
pub use document::{DocumentPipeline, OutboundMessenger, PipelineSettings, EXPORT_FORMAT};

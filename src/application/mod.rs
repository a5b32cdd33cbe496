//! Application layer - Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    ConversationOrchestrator, ConversationSettings, ConversationTexts, DocumentPipeline,
    InboundOutcome, OutboundMessenger, PipelineSettings, SendTemplateCommand, SendTemplateError,
    SendTemplateHandler,
};

//! WhatsApp Cloud API Adapters
//!
//! - **WhatsAppCloudClient** - Outbound messages and media uploads over the Graph API
//! - **webhook_types** - Inbound notification payloads
//! - **MockMessagingPlatform** - Recording platform for tests

mod cloud_client;
mod mock_platform;
mod webhook_types;

pub use cloud_client::{
    WhatsAppCloudClient, WhatsAppConfig, DEFAULT_GRAPH_API_URL, DEFAULT_GRAPH_API_VERSION,
};
pub use mock_platform::{MockMessagingPlatform, SentRecord, UploadedMedia};
pub use webhook_types::{
    ButtonContent, ChangeValue, InteractiveContent, ReplyContent, TextContent, WebhookChange,
    WebhookEntry, WebhookMessage, WebhookPayload,
};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## State Ports
//!
//! - `SessionStore` - Per-sender conversation state with per-sender locking
//! - `ArtifactStore` - Scoped scratch space for generated files
//!
//! ## External Service Ports
//!
//! - `SpreadsheetService` - Cell writes and region export
//! - `FormatConverter` - Export format to delivery format
//! - `MessagingPlatform` - Outbound text, media and template messages

mod artifact_store;
mod format_converter;
mod messaging_platform;
mod session_store;
mod spreadsheet_service;

pub use artifact_store::{ArtifactError, ArtifactScope, ArtifactStore};
pub use format_converter::{ConversionError, FormatConverter};
pub use messaging_platform::{
    MediaRef, MessagingError, MessagingPlatform, OutboundPayload, SentMessage, TemplateMessage,
};
pub use session_store::{SenderLock, SessionStore};
pub use spreadsheet_service::{SpreadsheetError, SpreadsheetService};

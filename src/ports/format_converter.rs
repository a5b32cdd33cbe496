//! Format Converter Port - Turning the export into the deliverable.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::document::DocumentFormat;

/// Port for document format conversion.
///
/// # Contract
///
/// - Only the first page of a paged source is converted.
/// - Converting a format to itself returns the input unchanged.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    async fn convert(
        &self,
        bytes: Vec<u8>,
        source: DocumentFormat,
        target: DocumentFormat,
    ) -> Result<Vec<u8>, ConversionError>;
}

/// Errors that can occur during conversion.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    #[error("cannot convert {from} to {to}")]
    Unsupported {
        from: DocumentFormat,
        to: DocumentFormat,
    },

    /// External converter binary is missing or cannot be started.
    #[error("converter unavailable: {0}")]
    ToolUnavailable(String),

    #[error("conversion failed: {0}")]
    Failed(String),

    #[error("converter produced no output")]
    EmptyOutput,

    #[error("conversion timed out after {0} seconds")]
    Timeout(u64),
}

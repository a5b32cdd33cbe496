//! Spreadsheet Service Port - Writing the input and rendering the region.
//!
//! The spreadsheet is an external collaborator: the pipeline only needs to
//! overwrite one cell and get the rendered region back as PDF bytes.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::document::{CellLocation, ExportRegion, PageLayout};

/// Port for the external spreadsheet.
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Clears `location` and writes `value` into it.
    ///
    /// Overwrites rather than appends so no content of a previous run survives.
    async fn clear_and_write(
        &self,
        location: &CellLocation,
        value: &str,
    ) -> Result<(), SpreadsheetError>;

    /// Renders `region` to a single-page PDF using `layout`.
    async fn export_region(
        &self,
        region: &ExportRegion,
        layout: &PageLayout,
    ) -> Result<Vec<u8>, SpreadsheetError>;
}

/// Errors from the spreadsheet service.
#[derive(Debug, Clone, Error)]
pub enum SpreadsheetError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("spreadsheet API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl SpreadsheetError {
    pub fn network(message: impl Into<String>) -> Self {
        SpreadsheetError::Network(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        SpreadsheetError::Api {
            status,
            message: message.into(),
        }
    }
}

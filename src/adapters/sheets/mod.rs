//! Spreadsheet Adapters
//!
//! Implementations of the SpreadsheetService port.
//!
//! - **GoogleSheetsService** - Sheets v4 values API plus the PDF export endpoint,
//!   authenticated with a service-account key
//! - **MockSpreadsheetService** - In-memory cells for tests

mod google_sheets;
mod mock_spreadsheet;
mod service_account;

pub use google_sheets::{
    GoogleSheetsConfig, GoogleSheetsService, DEFAULT_EXPORT_URL, DEFAULT_SHEETS_API_URL,
};
pub use mock_spreadsheet::{MockSpreadsheetService, SpreadsheetCall, MOCK_PDF_BYTES};
pub use service_account::{
    AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource,
    DEFAULT_TOKEN_URL, SHEETS_SCOPES,
};

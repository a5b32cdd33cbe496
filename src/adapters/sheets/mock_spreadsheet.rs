//! Mock Spreadsheet Service for testing.
//!
//! Keeps cell contents in memory so tests can assert that a write replaced
//! the previous value.
//!
//! # Features
//!
//! - Configurable export bytes
//! - Error injection per operation (consumed in order)
//! - Simulated delays per operation for timeout testing
//! - Call tracking
//!
//! # Example
//!
//! ```ignore
//! let sheets = MockSpreadsheetService::new()
//!     .with_export_error(SpreadsheetError::api(500, "backend error"));
//!
//! sheets.clear_and_write(&cell, "Ms. Rivera").await?;
//! assert_eq!(sheets.cell_value("Sheet1!B2").as_deref(), Some("Ms. Rivera"));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::document::{CellLocation, ExportRegion, PageLayout};
use crate::ports::{SpreadsheetError, SpreadsheetService};

/// Bytes returned by default from `export_region`.
pub const MOCK_PDF_BYTES: &[u8] = b"%PDF-1.4\n% mock timetable\n";

/// Recorded call to the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum SpreadsheetCall {
    ClearAndWrite { cell: String, value: String },
    Export { region: ExportRegion, layout: PageLayout },
}

/// Mock spreadsheet for testing.
#[derive(Debug, Clone)]
pub struct MockSpreadsheetService {
    cells: Arc<Mutex<HashMap<String, String>>>,
    write_errors: Arc<Mutex<VecDeque<SpreadsheetError>>>,
    export_errors: Arc<Mutex<VecDeque<SpreadsheetError>>>,
    export_bytes: Vec<u8>,
    write_delay: Duration,
    export_delay: Duration,
    calls: Arc<Mutex<Vec<SpreadsheetCall>>>,
}

impl Default for MockSpreadsheetService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpreadsheetService {
    pub fn new() -> Self {
        Self {
            cells: Arc::new(Mutex::new(HashMap::new())),
            write_errors: Arc::new(Mutex::new(VecDeque::new())),
            export_errors: Arc::new(Mutex::new(VecDeque::new())),
            export_bytes: MOCK_PDF_BYTES.to_vec(),
            write_delay: Duration::ZERO,
            export_delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sets the bytes returned by every successful export.
    pub fn with_export_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.export_bytes = bytes.into();
        self
    }

    /// Queues an error for the next `clear_and_write`.
    pub fn with_write_error(self, error: SpreadsheetError) -> Self {
        self.write_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
        self
    }

    /// Queues an error for the next `export_region`.
    pub fn with_export_error(self, error: SpreadsheetError) -> Self {
        self.export_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn with_export_delay(mut self, delay: Duration) -> Self {
        self.export_delay = delay;
        self
    }

    /// Seeds a cell, e.g. with the value left by a previous run.
    pub fn set_cell(&self, cell: impl Into<String>, value: impl Into<String>) {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cell.into(), value.into());
    }

    pub fn cell_value(&self, cell: &str) -> Option<String> {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(cell)
            .cloned()
    }

    pub fn calls(&self) -> Vec<SpreadsheetCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Values written, in order.
    pub fn written_values(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SpreadsheetCall::ClearAndWrite { value, .. } => Some(value),
                SpreadsheetCall::Export { .. } => None,
            })
            .collect()
    }

    pub fn export_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SpreadsheetCall::Export { .. }))
            .count()
    }

    fn record(&self, call: SpreadsheetCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl SpreadsheetService for MockSpreadsheetService {
    async fn clear_and_write(
        &self,
        location: &CellLocation,
        value: &str,
    ) -> Result<(), SpreadsheetError> {
        self.record(SpreadsheetCall::ClearAndWrite {
            cell: location.to_string(),
            value: value.to_string(),
        });

        if !self.write_delay.is_zero() {
            sleep(self.write_delay).await;
        }

        let queued = self
            .write_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = queued {
            return Err(error);
        }

        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.remove(location.as_str());
        cells.insert(location.to_string(), value.to_string());
        Ok(())
    }

    async fn export_region(
        &self,
        region: &ExportRegion,
        layout: &PageLayout,
    ) -> Result<Vec<u8>, SpreadsheetError> {
        self.record(SpreadsheetCall::Export {
            region: region.clone(),
            layout: *layout,
        });

        if !self.export_delay.is_zero() {
            sleep(self.export_delay).await;
        }

        let queued = self
            .export_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match queued {
            Some(error) => Err(error),
            None => Ok(self.export_bytes.clone()),
        }
    }
}

//! Mock Format Converter for testing.
//!
//! Returns a fixed PNG-looking payload for PDF to PNG conversions and the
//! input unchanged for same-format conversions. Errors and delays are
//! configurable; calls are recorded.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::document::DocumentFormat;
use crate::ports::{ConversionError, FormatConverter};

/// Bytes returned by default for a PNG target.
pub const MOCK_PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n mock timetable";

/// Recorded conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionCall {
    pub source: DocumentFormat,
    pub target: DocumentFormat,
    pub input_len: usize,
}

/// Mock converter for testing.
#[derive(Debug, Clone)]
pub struct MockFormatConverter {
    errors: Arc<Mutex<VecDeque<ConversionError>>>,
    output: Vec<u8>,
    delay: Duration,
    calls: Arc<Mutex<Vec<ConversionCall>>>,
}

impl Default for MockFormatConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFormatConverter {
    pub fn new() -> Self {
        Self {
            errors: Arc::new(Mutex::new(VecDeque::new())),
            output: MOCK_PNG_BYTES.to_vec(),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_output(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.output = bytes.into();
        self
    }

    /// Queues an error for the next conversion.
    pub fn with_error(self, error: ConversionError) -> Self {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<ConversionCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl FormatConverter for MockFormatConverter {
    async fn convert(
        &self,
        bytes: Vec<u8>,
        source: DocumentFormat,
        target: DocumentFormat,
    ) -> Result<Vec<u8>, ConversionError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ConversionCall {
                source,
                target,
                input_len: bytes.len(),
            });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let queued = self
            .errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = queued {
            return Err(error);
        }

        if source == target {
            Ok(bytes)
        } else {
            Ok(self.output.clone())
        }
    }
}

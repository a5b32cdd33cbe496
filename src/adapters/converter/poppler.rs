//! Poppler based format converter.
//!
//! Rasterises the first page of a PDF with `pdftoppm` (part of
//! poppler-utils), piping the document through stdin and reading the PNG from
//! stdout so no extra files are created.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::document::DocumentFormat;
use crate::ports::{ConversionError, FormatConverter};

/// Converter using the `pdftoppm` executable.
///
/// # Example
///
/// ```rust,ignore
/// let converter = PopplerConverter::new().with_dpi(150);
/// let png = converter.convert(pdf, DocumentFormat::Pdf, DocumentFormat::Png).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PopplerConverter {
    /// Path to pdftoppm. If None, will search PATH.
    pdftoppm_path: Option<String>,

    /// Render resolution in dots per inch.
    dpi: u32,

    timeout_secs: u64,
}

impl Default for PopplerConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PopplerConverter {
    pub fn new() -> Self {
        Self {
            pdftoppm_path: None,
            dpi: 150,
            timeout_secs: 30,
        }
    }

    pub fn with_pdftoppm_path(mut self, path: impl Into<String>) -> Self {
        self.pdftoppm_path = Some(path.into());
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn command(&self) -> &str {
        self.pdftoppm_path.as_deref().unwrap_or("pdftoppm")
    }

    /// Arguments rendering page one of stdin to a single PNG on stdout.
    fn args(&self) -> Vec<String> {
        vec![
            "-png".to_string(),
            "-f".to_string(),
            "1".to_string(),
            "-l".to_string(),
            "1".to_string(),
            "-singlefile".to_string(),
            "-r".to_string(),
            self.dpi.to_string(),
            "-".to_string(),
        ]
    }

    async fn pdf_to_png(&self, pdf: Vec<u8>) -> Result<Vec<u8>, ConversionError> {
        let mut child = Command::new(self.command())
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ConversionError::ToolUnavailable(format!("cannot start {}: {}", self.command(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&pdf)
                .await
                .map_err(|e| ConversionError::Failed(format!("writing to pdftoppm: {}", e)))?;
        }

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ConversionError::Timeout(self.timeout_secs))?
        .map_err(|e| ConversionError::Failed(format!("pdftoppm execution failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::Failed(format!(
                "pdftoppm returned {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(ConversionError::EmptyOutput);
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl FormatConverter for PopplerConverter {
    async fn convert(
        &self,
        bytes: Vec<u8>,
        source: DocumentFormat,
        target: DocumentFormat,
    ) -> Result<Vec<u8>, ConversionError> {
        match (source, target) {
            (s, t) if s == t => Ok(bytes),
            (DocumentFormat::Pdf, DocumentFormat::Png) => self.pdf_to_png(bytes).await,
            (from, to) => Err(ConversionError::Unsupported { from, to }),
        }
    }
}

//! Generated artifacts and their formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::foundation::{ExecutionId, SenderId, ValidationError};

/// File formats the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Paged document, the export format.
    Pdf,
    /// Raster image of the first page.
    #[default]
    Png,
}

impl DocumentFormat {
    /// MIME type used when uploading to the messaging platform.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Png => "png",
        }
    }

    /// Images are delivered inline; everything else as a document attachment.
    pub fn is_image(&self) -> bool {
        matches!(self, DocumentFormat::Png)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "png" => Ok(DocumentFormat::Png),
            other => Err(ValidationError::invalid_format(
                "document_format",
                format!("unsupported format '{}'", other),
            )),
        }
    }
}

/// Where in the pipeline an artifact sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// Output of the export step.
    Intermediate,
    /// Output of the convert step; what gets delivered.
    Final,
}

impl ArtifactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactRole::Intermediate => "intermediate",
            ArtifactRole::Final => "final",
        }
    }
}

/// A file generated for one flow execution.
///
/// Owned by the execution that created it; removed with the execution's
/// scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub role: ArtifactRole,
    pub format: DocumentFormat,
    pub owner: SenderId,
    pub execution_id: ExecutionId,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name shown to the recipient for document deliveries.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("document.{}", self.format.extension()))
    }
}

//! Document pipeline configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::storage::DEFAULT_ARTIFACT_BASENAME;
use crate::domain::document::DocumentFormat;

/// Document pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Format delivered to the sender (`png` or `pdf`)
    #[serde(default)]
    pub delivery_format: DocumentFormat,

    /// Parent directory of per-execution scratch directories
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Base name of generated files
    #[serde(default = "default_basename")]
    pub artifact_basename: String,

    /// Upper bound on each external step
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    /// pdftoppm binary; searched on PATH when unset
    pub pdftoppm_path: Option<String>,

    #[serde(default = "default_render_dpi")]
    pub render_dpi: u32,
}

impl PipelineConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.step_timeout_secs == 0 || self.step_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(36..=600).contains(&self.render_dpi) {
            return Err(ValidationError::invalid_value(
                "pipeline.render_dpi",
                format!("{} is outside 36..=600", self.render_dpi),
            ));
        }
        let basename = self.artifact_basename.trim();
        if basename.is_empty() || basename.contains(['/', '\\']) || basename.starts_with('.') {
            return Err(ValidationError::invalid_value(
                "pipeline.artifact_basename",
                "must be a plain file name",
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delivery_format: DocumentFormat::default(),
            artifact_dir: default_artifact_dir(),
            artifact_basename: default_basename(),
            step_timeout_secs: default_step_timeout(),
            pdftoppm_path: None,
            render_dpi: default_render_dpi(),
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir().join("sheet-courier")
}

fn default_basename() -> String {
    DEFAULT_ARTIFACT_BASENAME.to_string()
}

fn default_step_timeout() -> u64 {
    30
}

fn default_render_dpi() -> u32 {
    150
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.delivery_format, DocumentFormat::Png);
        assert_eq!(config.step_timeout(), Duration::from_secs(30));
        assert!(config.artifact_dir.ends_with("sheet-courier"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn delivery_format_deserializes_lowercase() {
        let config: PipelineConfig = serde_json::from_str(r#"{"delivery_format":"pdf"}"#).unwrap();
        assert_eq!(config.delivery_format, DocumentFormat::Pdf);
    }

    #[test]
    fn rejects_path_like_basename() {
        let config = PipelineConfig {
            artifact_basename: "../escape".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = PipelineConfig {
            step_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTimeout)));
    }
}

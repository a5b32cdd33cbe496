//! Spreadsheet configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::sheets::{GoogleSheetsConfig, DEFAULT_EXPORT_URL, DEFAULT_SHEETS_API_URL};
use crate::domain::document::{
    CellLocation, ExportRegion, Orientation, PageLayout, PageMargins, PaperSize,
};

/// Spreadsheet configuration
///
/// Names the sheet the input is written to and the region that gets exported.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet id from the sheet's URL
    pub spreadsheet_id: String,

    /// Service-account key file
    pub credentials_path: Option<PathBuf>,

    /// Pre-minted OAuth token, used when no key file is configured
    pub access_token: Option<Secret<String>>,

    /// Cell receiving the captured input, A1 notation
    #[serde(default = "default_input_cell")]
    pub input_cell: String,

    /// Numeric id of the exported tab
    #[serde(default)]
    pub sheet_gid: u64,

    /// Exported range; whole tab when unset
    pub export_range: Option<String>,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default)]
    pub paper_size: PaperSize,

    /// Uniform page margin in inches
    #[serde(default = "default_margin")]
    pub margin_inches: f32,

    #[serde(default = "default_true")]
    pub fit_to_width: bool,

    #[serde(default)]
    pub gridlines: bool,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_export_base_url")]
    pub export_base_url: String,

    /// Overrides the key file's token endpoint
    pub token_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SheetsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("SHEETS__SPREADSHEET_ID"));
        }
        let has_token = self
            .access_token
            .as_ref()
            .map(|t| !t.expose_secret().trim().is_empty())
            .unwrap_or(false);
        if self.credentials_path.is_none() && !has_token {
            return Err(ValidationError::NoSpreadsheetCredentials);
        }
        self.input_cell()?;
        self.export_region()?;
        self.page_layout()?;
        for (field, url) in [
            ("sheets.api_base_url", &self.api_base_url),
            ("sheets.export_base_url", &self.export_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl(field));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn input_cell(&self) -> Result<CellLocation, ValidationError> {
        CellLocation::new(self.input_cell.as_str())
            .map_err(|e| ValidationError::invalid_value("sheets.input_cell", e.to_string()))
    }

    pub fn export_region(&self) -> Result<ExportRegion, ValidationError> {
        ExportRegion::new(self.sheet_gid, self.export_range.clone())
            .map_err(|e| ValidationError::invalid_value("sheets.export_range", e.to_string()))
    }

    pub fn page_layout(&self) -> Result<PageLayout, ValidationError> {
        let margins = PageMargins::uniform(self.margin_inches);
        margins
            .validate()
            .map_err(|e| ValidationError::invalid_value("sheets.margin_inches", e.to_string()))?;
        Ok(PageLayout {
            orientation: self.orientation,
            paper_size: self.paper_size,
            margins,
            fit_to_width: self.fit_to_width,
            gridlines: self.gridlines,
        })
    }

    /// Client configuration for the Google Sheets adapter.
    pub fn client_config(&self) -> GoogleSheetsConfig {
        GoogleSheetsConfig::new(self.spreadsheet_id.clone())
            .with_api_base_url(self.api_base_url.clone())
            .with_export_base_url(self.export_base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn default_input_cell() -> String {
    "Sheet1!B2".to_string()
}

fn default_margin() -> f32 {
    0.25
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    DEFAULT_SHEETS_API_URL.to_string()
}

fn default_export_base_url() -> String {
    DEFAULT_EXPORT_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SheetsConfig {
        serde_json::from_str(
            r#"{
                "spreadsheet_id": "1AbC",
                "credentials_path": "/etc/sheet-courier/key.json"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_apply() {
        let config = config();
        assert_eq!(config.input_cell, "Sheet1!B2");
        assert_eq!(config.sheet_gid, 0);
        assert_eq!(config.orientation, Orientation::Landscape);
        assert_eq!(config.paper_size, PaperSize::A4);
        assert!(config.fit_to_width);
        assert!(!config.gridlines);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn layout_comes_from_config() {
        let config = SheetsConfig {
            orientation: Orientation::Portrait,
            margin_inches: 0.5,
            gridlines: true,
            ..config()
        };
        let layout = config.page_layout().unwrap();
        assert_eq!(layout.orientation, Orientation::Portrait);
        assert_eq!(layout.margins, PageMargins::uniform(0.5));
        assert!(layout.gridlines);
    }

    #[test]
    fn requires_some_credentials() {
        let config = SheetsConfig {
            credentials_path: None,
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NoSpreadsheetCredentials)
        ));

        let config = SheetsConfig {
            access_token: Some(Secret::new("ya29.token".to_string())),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_cell_and_range() {
        let config = SheetsConfig {
            input_cell: "nope".to_string(),
            ..config()
        };
        assert!(config.validate().is_err());

        let config = SheetsConfig {
            export_range: Some("A1:??".to_string()),
            ..config
        };
        assert!(config.export_region().is_err());
    }

    #[test]
    fn rejects_huge_margins() {
        let config = SheetsConfig {
            margin_inches: 5.0,
            ..config()
        };
        assert!(config.page_layout().is_err());
    }
}

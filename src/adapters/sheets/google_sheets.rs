//! Google Sheets Adapter - Implementation of SpreadsheetService.
//!
//! Writes through the Sheets v4 values API and renders through the
//! spreadsheet export endpoint, which returns the print layout as PDF.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GoogleSheetsConfig::new("1AbC...xyz")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let service = GoogleSheetsService::new(config, token_source)?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::domain::document::{CellLocation, ExportRegion, Orientation, PageLayout};
use crate::ports::{SpreadsheetError, SpreadsheetService};

use super::AccessTokenSource;

pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_EXPORT_URL: &str = "https://docs.google.com";

/// Configuration for the Google Sheets adapter.
#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    /// Spreadsheet id from the sheet's URL.
    pub spreadsheet_id: String,
    pub api_base_url: String,
    pub export_base_url: String,
    pub timeout: Duration,
}

impl GoogleSheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            api_base_url: DEFAULT_SHEETS_API_URL.to_string(),
            export_base_url: DEFAULT_EXPORT_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_export_base_url(mut self, url: impl Into<String>) -> Self {
        self.export_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// Google Sheets implementation of [`SpreadsheetService`].
pub struct GoogleSheetsService {
    config: GoogleSheetsConfig,
    client: Client,
    tokens: Arc<dyn AccessTokenSource>,
}

impl GoogleSheetsService {
    pub fn new(
        config: GoogleSheetsConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, SpreadsheetError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpreadsheetError::network(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    /// `.../v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SpreadsheetError> {
        let mut url = parse_base(&self.config.api_base_url)?;
        url.path_segments_mut()
            .map_err(|_| SpreadsheetError::InvalidResponse("API base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.config.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    /// Export URL carrying the region and page layout as query parameters.
    fn export_url(&self, region: &ExportRegion, layout: &PageLayout) -> Result<Url, SpreadsheetError> {
        let mut url = parse_base(&self.config.export_base_url)?;
        url.path_segments_mut()
            .map_err(|_| SpreadsheetError::InvalidResponse("export base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["spreadsheets", "d", self.config.spreadsheet_id.as_str(), "export"]);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("format", "pdf")
                .append_pair("gid", &region.sheet_gid.to_string());
            if let Some(range) = &region.range {
                query.append_pair("range", range);
            }
            query
                .append_pair(
                    "portrait",
                    bool_param(layout.orientation == Orientation::Portrait),
                )
                .append_pair("size", layout.paper_size.as_str())
                .append_pair("fitw", bool_param(layout.fit_to_width))
                .append_pair("gridlines", bool_param(layout.gridlines))
                .append_pair("top_margin", &layout.margins.top.to_string())
                .append_pair("bottom_margin", &layout.margins.bottom.to_string())
                .append_pair("left_margin", &layout.margins.left.to_string())
                .append_pair("right_margin", &layout.margins.right.to_string())
                .append_pair("printtitle", "false")
                .append_pair("sheetnames", "false")
                .append_pair("pagenum", "UNDEFINED")
                .append_pair("fzr", "false");
        }
        Ok(url)
    }

    async fn bearer(&self) -> Result<String, SpreadsheetError> {
        let token = self.tokens.access_token().await?;
        Ok(format!("Bearer {}", token.expose_secret()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> SpreadsheetError {
        if e.is_timeout() {
            SpreadsheetError::network(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs()
            ))
        } else if e.is_connect() {
            SpreadsheetError::network(format!("connection failed: {}", e))
        } else {
            SpreadsheetError::network(e.to_string())
        }
    }

    async fn check_status(response: Response) -> Result<Response, SpreadsheetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(SpreadsheetError::Authentication(format!(
                "spreadsheet API returned {}: {}",
                status, body
            ))),
            code => Err(SpreadsheetError::api(code, body)),
        }
    }
}

fn parse_base(base: &str) -> Result<Url, SpreadsheetError> {
    Url::parse(base)
        .map_err(|e| SpreadsheetError::InvalidResponse(format!("invalid base URL {}: {}", base, e)))
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsService {
    async fn clear_and_write(
        &self,
        location: &CellLocation,
        value: &str,
    ) -> Result<(), SpreadsheetError> {
        let auth = self.bearer().await?;

        let clear_url = self.values_url(location.as_str(), ":clear")?;
        let response = self
            .client
            .post(clear_url)
            .header("Authorization", &auth)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;

        let mut write_url = self.values_url(location.as_str(), "")?;
        write_url
            .query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let body = ValueRange {
            range: location.as_str(),
            major_dimension: "ROWS",
            values: [[value]],
        };
        let response = self
            .client
            .put(write_url)
            .header("Authorization", &auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;

        tracing::debug!(cell = %location, "Wrote input cell");
        Ok(())
    }

    async fn export_region(
        &self,
        region: &ExportRegion,
        layout: &PageLayout,
    ) -> Result<Vec<u8>, SpreadsheetError> {
        let auth = self.bearer().await?;
        let url = self.export_url(region, layout)?;

        let response = self
            .client
            .get(url)
            .header("Authorization", &auth)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpreadsheetError::network(format!("reading export body: {}", e)))?;

        // Sign-in pages come back as 200 text/html when the token lacks access
        if !bytes.starts_with(b"%PDF") {
            return Err(SpreadsheetError::InvalidResponse(
                "export did not return a PDF document".to_string(),
            ));
        }

        tracing::debug!(bytes = bytes.len(), gid = region.sheet_gid, "Exported region");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sheets::StaticTokenSource;
    use crate::domain::document::{PageMargins, PaperSize};
    use std::collections::HashMap;

    fn service() -> GoogleSheetsService {
        GoogleSheetsService::new(
            GoogleSheetsConfig::new("sheet-123"),
            Arc::new(StaticTokenSource::new("token")),
        )
        .unwrap()
    }

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn values_url_targets_cell() {
        let url = service().values_url("Sheet1!B2", ":clear").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Sheet1!B2:clear"
        );
    }

    #[test]
    fn values_url_encodes_spaces_in_sheet_name() {
        let url = service().values_url("'Week A'!B2", "").unwrap();
        assert!(url.as_str().ends_with("/values/'Week%20A'!B2"));
    }

    #[test]
    fn export_url_carries_layout() {
        let region = ExportRegion::new(42, Some("A1:H30".to_string())).unwrap();
        let layout = PageLayout {
            orientation: Orientation::Landscape,
            paper_size: PaperSize::Letter,
            margins: PageMargins::uniform(0.5),
            fit_to_width: true,
            gridlines: false,
        };

        let url = service().export_url(&region, &layout).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://docs.google.com/spreadsheets/d/sheet-123/export?"));

        let q = query(&url);
        assert_eq!(q["format"], "pdf");
        assert_eq!(q["gid"], "42");
        assert_eq!(q["range"], "A1:H30");
        assert_eq!(q["portrait"], "false");
        assert_eq!(q["size"], "letter");
        assert_eq!(q["fitw"], "true");
        assert_eq!(q["gridlines"], "false");
        assert_eq!(q["top_margin"], "0.5");
        assert_eq!(q["pagenum"], "UNDEFINED");
        assert_eq!(q["sheetnames"], "false");
    }

    #[test]
    fn export_url_omits_absent_range() {
        let region = ExportRegion::new(0, None).unwrap();
        let url = service().export_url(&region, &PageLayout::default()).unwrap();
        assert!(!query(&url).contains_key("range"));
    }

    #[test]
    fn base_url_with_trailing_slash() {
        let service = GoogleSheetsService::new(
            GoogleSheetsConfig::new("abc").with_api_base_url("http://localhost:8089/"),
            Arc::new(StaticTokenSource::new("token")),
        )
        .unwrap();
        let url = service.values_url("B2", "").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8089/v4/spreadsheets/abc/values/B2");
    }

    #[tokio::test]
    async fn unreachable_api_is_network_error() {
        let service = GoogleSheetsService::new(
            GoogleSheetsConfig::new("abc")
                .with_api_base_url("http://127.0.0.1:1")
                .with_timeout(Duration::from_secs(2)),
            Arc::new(StaticTokenSource::new("token")),
        )
        .unwrap();

        let cell = CellLocation::new("Sheet1!B2").unwrap();
        let result = service.clear_and_write(&cell, "Ms. Rivera").await;
        assert!(matches!(result, Err(SpreadsheetError::Network(_))));
    }
}

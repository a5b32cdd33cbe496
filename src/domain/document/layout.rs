//! Spreadsheet locations and export layout parameters.
//!
//! Layout travels with every export request so the rendered page does not
//! depend on how the sheet currently happens to be viewed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A single target cell in A1 notation, optionally qualified by sheet name.
///
/// `Sheet1!B2`, `'Week A'!C3` and `B2` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellLocation(String);

impl CellLocation {
    pub fn new(location: impl Into<String>) -> Result<Self, ValidationError> {
        let location = location.into().trim().to_string();
        if location.is_empty() {
            return Err(ValidationError::empty_field("input_cell"));
        }
        let cell = match location.rsplit_once('!') {
            Some((sheet, cell)) => {
                if sheet.trim_matches('\'').is_empty() {
                    return Err(ValidationError::invalid_format(
                        "input_cell",
                        "sheet name before '!' is empty",
                    ));
                }
                cell
            }
            None => location.as_str(),
        };
        if !is_a1_cell(cell) {
            return Err(ValidationError::invalid_format(
                "input_cell",
                format!("'{}' is not an A1 cell reference", cell),
            ));
        }
        Ok(Self(location))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CellLocation {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CellLocation> for String {
    fn from(value: CellLocation) -> Self {
        value.0
    }
}

impl fmt::Display for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of the spreadsheet that gets rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExportRegion {
    /// Numeric id of the sheet tab.
    pub sheet_gid: u64,
    /// Optional `A1:H30` style range; the whole tab when absent.
    pub range: Option<String>,
}

impl ExportRegion {
    pub fn new(sheet_gid: u64, range: Option<String>) -> Result<Self, ValidationError> {
        let range = range.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if let Some(range) = &range {
            let valid = match range.split_once(':') {
                Some((start, end)) => is_a1_cell(start) && is_a1_cell(end),
                None => is_a1_cell(range),
            };
            if !valid {
                return Err(ValidationError::invalid_format(
                    "export_range",
                    format!("'{}' is not an A1 range", range),
                ));
            }
        }
        Ok(Self { sheet_gid, range })
    }
}

/// Page orientation of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

/// Paper size of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
}

impl PaperSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::A3 => "A3",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl PageMargins {
    pub fn uniform(inches: f32) -> Self {
        Self {
            top: inches,
            bottom: inches,
            left: inches,
            right: inches,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("top", self.top),
            ("bottom", self.bottom),
            ("left", self.left),
            ("right", self.right),
        ] {
            if !(0.0..=3.0).contains(&value) {
                return Err(ValidationError::invalid_format(
                    "margins",
                    format!("{} margin {} is outside 0..=3 inches", name, value),
                ));
            }
        }
        Ok(())
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(0.25)
    }
}

/// Fixed layout of the single exported page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    pub margins: PageMargins,
    /// Scale the region to fit the page width.
    pub fit_to_width: bool,
    pub gridlines: bool,
}

fn is_a1_cell(cell: &str) -> bool {
    let cell = cell.trim().trim_start_matches('$');
    let letters = cell.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let rest = cell[letters..].trim_start_matches('$');
    (1..=3).contains(&letters) && !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

//! Document domain module.
//!
//! Artifacts produced by the document pipeline and the location/layout values
//! that describe what gets written and rendered.

mod artifact;
mod layout;

pub use artifact::{Artifact, ArtifactRole, DocumentFormat};
pub use layout::{CellLocation, ExportRegion, Orientation, PageLayout, PageMargins, PaperSize};

//! Format Converter Adapters
//!
//! - **PopplerConverter** - First-page rasterisation with `pdftoppm`
//! - **MockFormatConverter** - Canned output for tests

mod mock_converter;
mod poppler;

pub use mock_converter::{ConversionCall, MockFormatConverter, MOCK_PNG_BYTES};
pub use poppler::PopplerConverter;

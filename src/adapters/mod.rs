//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `converter` - PDF to image conversion (pdftoppm)
//! - `http` - Webhook gateway (axum)
//! - `sheets` - Google Sheets values and export API
//! - `storage` - Session store and artifact scratch space
//! - `whatsapp` - WhatsApp Cloud API client and webhook payloads

pub mod converter;
pub mod http;
pub mod sheets;
pub mod storage;
pub mod whatsapp;

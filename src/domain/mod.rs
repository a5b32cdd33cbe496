//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors, state machine trait)
//! - `conversation` - Per-sender flow state, transitions and failure taxonomy
//! - `document` - Generated artifacts, cell locations and export layout
//! - `webhook` - Verification handshake and inbound messages

pub mod conversation;
pub mod document;
pub mod foundation;
pub mod webhook;

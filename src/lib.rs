//! Sheet Courier - WhatsApp front end for a spreadsheet-rendered document
//!
//! A sender types the start command, answers one prompt, and receives a
//! region of a Google Sheet rendered as an image or PDF. The answer is written
//! into a configured input cell so the sheet's formulas do the lookup.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

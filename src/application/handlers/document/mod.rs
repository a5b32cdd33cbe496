//! Document handlers.
//!
//! Producing the timetable artifact and delivering it to the sender.

mod deliver;
mod pipeline;

pub use deliver::OutboundMessenger;
pub use pipeline::{DocumentPipeline, PipelineSettings, EXPORT_FORMAT};

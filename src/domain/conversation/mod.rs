//! Conversation domain module.
//!
//! Per-sender flow state, start command recognition, the pure transition
//! function, and the failure taxonomy of a flow execution.

mod command;
mod errors;
mod phase;
mod state;
mod transition;

pub use command::StartCommand;
pub use errors::{
    DeliveryError, DeliveryStage, FlowError, PipelineStep, PipelineStepError, StepFailure,
};
pub use phase::FlowPhase;
pub use state::{ConversationState, Session};
pub use transition::{CapturedInput, FlowAction, Transition};

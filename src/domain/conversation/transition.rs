//! Pure transition function of the conversation state machine.
//!
//! Given the stored state and an inbound text, decide the state to store and
//! the side effect to perform. No I/O happens here; the orchestrator applies
//! the result while holding the sender's lock.

use serde::{Deserialize, Serialize};

use super::{ConversationState, FlowPhase, StartCommand};

/// Input captured from the sender while awaiting input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedInput {
    /// Name of the awaited field.
    pub field: String,
    /// Trimmed message text.
    pub value: String,
}

impl CapturedInput {
    pub fn new(field: impl Into<String>, value: &str) -> Self {
        Self {
            field: field.into(),
            value: value.trim().to_string(),
        }
    }
}

/// Side effect the orchestrator must perform after applying a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    /// Ask the sender for the input.
    SendPrompt,
    /// Explain how to start a flow.
    SendHelp,
    /// Run the document pipeline with the captured input and deliver the result.
    RunPipeline(CapturedInput),
}

/// Outcome of feeding one message to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: FlowPhase,
    pub to: FlowPhase,
    /// State to store once the transition is applied; `Idle` means clear.
    pub next_state: ConversationState,
    pub action: FlowAction,
}

impl ConversationState {
    /// Decides what a message means in this state.
    ///
    /// While awaiting input every message is the input, including one that
    /// spells the start command. The stored state for a captured input is
    /// `Idle` so that the session is cleared before the pipeline runs.
    pub fn on_message(&self, text: &str, command: &StartCommand, input_field: &str) -> Transition {
        match self {
            ConversationState::Idle if command.matches(text) => Transition {
                from: FlowPhase::Idle,
                to: FlowPhase::AwaitingInput,
                next_state: ConversationState::awaiting(input_field),
                action: FlowAction::SendPrompt,
            },
            ConversationState::Idle => Transition {
                from: FlowPhase::Idle,
                to: FlowPhase::Idle,
                next_state: ConversationState::Idle,
                action: FlowAction::SendHelp,
            },
            ConversationState::AwaitingInput { field } => Transition {
                from: FlowPhase::AwaitingInput,
                to: FlowPhase::Processing,
                next_state: ConversationState::Idle,
                action: FlowAction::RunPipeline(CapturedInput::new(field.clone(), text)),
            },
        }
    }
}

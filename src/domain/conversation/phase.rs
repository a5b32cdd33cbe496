//! Flow phase state machine.
//!
//! `Processing` is never stored; it names the stretch between capturing the
//! input and finishing delivery, during which the sender is already idle as far
//! as the session store is concerned.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Phase of a sender's flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    /// No session entry for the sender.
    #[default]
    Idle,

    /// Start command received; the next message is the input.
    AwaitingInput,

    /// Input captured; the document pipeline is running.
    Processing,
}

impl StateMachine for FlowPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use FlowPhase::*;
        matches!(
            (self, target),
            // Help fallback leaves the sender where they were
            (Idle, Idle) |
            (Idle, AwaitingInput) |
            (AwaitingInput, Processing) |
            (Processing, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use FlowPhase::*;
        match self {
            Idle => vec![Idle, AwaitingInput],
            AwaitingInput => vec![Processing],
            Processing => vec![Idle],
        }
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlowPhase::Idle => "idle",
            FlowPhase::AwaitingInput => "awaiting_input",
            FlowPhase::Processing => "processing",
        };
        write!(f, "{}", s)
    }
}

//! Per-sender conversation state and the session record that carries it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{SenderId, Timestamp};

use super::FlowPhase;

/// Stored conversation state of one sender.
///
/// Idle senders have no session at all; `Idle` exists so callers can talk about
/// "absent" without reaching for `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,

    /// Waiting for the value of `field`.
    AwaitingInput { field: String },
}

impl ConversationState {
    /// Creates the awaiting state for the named input field.
    pub fn awaiting(field: impl Into<String>) -> Self {
        Self::AwaitingInput {
            field: field.into(),
        }
    }

    /// Phase this state corresponds to.
    pub fn phase(&self) -> FlowPhase {
        match self {
            Self::Idle => FlowPhase::Idle,
            Self::AwaitingInput { .. } => FlowPhase::AwaitingInput,
        }
    }

    /// Returns true when no flow is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// A flow in progress for one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub sender_id: SenderId,
    pub state: ConversationState,
    pub created_at: Timestamp,
}

impl Session {
    /// Starts a session in the given state at the current time.
    pub fn new(sender_id: SenderId, state: ConversationState) -> Self {
        Self {
            sender_id,
            state,
            created_at: Timestamp::now(),
        }
    }

    /// Returns true once the session has outlived `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: &Timestamp) -> bool {
        let age = now.duration_since(&self.created_at);
        match age.to_std() {
            Ok(age) => age >= ttl,
            // Created in the future: clock moved backwards, keep it
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SenderId {
        SenderId::new("15551234567").unwrap()
    }

    #[test]
    fn default_state_is_idle() {
        assert!(ConversationState::default().is_idle());
        assert_eq!(ConversationState::default().phase(), FlowPhase::Idle);
    }

    #[test]
    fn awaiting_state_reports_phase() {
        let state = ConversationState::awaiting("teacher_name");
        assert!(!state.is_idle());
        assert_eq!(state.phase(), FlowPhase::AwaitingInput);
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let session = Session::new(sender(), ConversationState::awaiting("teacher_name"));
        assert!(!session.is_expired(Duration::from_secs(600), &Timestamp::now()));
    }

    #[test]
    fn session_expires_after_ttl() {
        let session = Session::new(sender(), ConversationState::awaiting("teacher_name"));
        let later = session.created_at.plus_secs(601);
        assert!(session.is_expired(Duration::from_secs(600), &later));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let session = Session::new(sender(), ConversationState::awaiting("teacher_name"));
        assert!(session.is_expired(Duration::ZERO, &session.created_at));
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(ConversationState::awaiting("teacher_name")).unwrap();
        assert_eq!(json["state"], "awaiting_input");
        assert_eq!(json["field"], "teacher_name");
    }
}

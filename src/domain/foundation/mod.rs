//! Foundation module - Shared domain primitives.
//!
//! Value objects, errors and the state machine trait used by the conversation,
//! document and webhook modules.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ExecutionId, SenderId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;

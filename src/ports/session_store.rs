//! Session Store Port - Per-sender conversation state.
//!
//! Maps a sender to the flow they have in progress. Idle senders have no
//! entry. Access to one sender's entry goes through a [`SenderLock`], which
//! makes "read, decide, write" atomic per sender: two near-simultaneous
//! messages from the same sender cannot both observe "absent" and both start a
//! flow. Different senders never contend with each other.
//!
//! Store operations do not fail. State lives in memory for the lifetime of the
//! process and is lost on restart.

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::conversation::{ConversationState, Session};
use crate::domain::foundation::SenderId;

/// Exclusive access to one sender's session entry.
///
/// Released on drop. Hold it only for the read-decide-write step, never across
/// the document pipeline.
pub struct SenderLock {
    sender_id: SenderId,
    _guard: OwnedMutexGuard<()>,
}

impl SenderLock {
    /// Wraps an acquired per-sender mutex guard.
    pub fn new(sender_id: SenderId, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            sender_id,
            _guard: guard,
        }
    }

    /// The sender this lock serializes.
    pub fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }
}

impl std::fmt::Debug for SenderLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderLock")
            .field("sender_id", &self.sender_id.masked())
            .finish()
    }
}

/// Port for per-sender session state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Waits for exclusive access to the sender's entry.
    async fn lock(&self, sender_id: &SenderId) -> SenderLock;

    /// Current session, or `None` when the sender is idle.
    ///
    /// Sessions older than the store's time-to-live are treated as absent and
    /// removed.
    async fn get(&self, lock: &SenderLock) -> Option<Session>;

    /// Stores `state` for the sender. Storing `Idle` clears the entry.
    async fn set(&self, lock: &SenderLock, state: ConversationState);

    /// Removes the sender's entry, returning what was there.
    async fn clear(&self, lock: &SenderLock) -> Option<Session>;

    /// Drops every expired session; returns how many were removed.
    async fn purge_expired(&self) -> usize;

    /// Number of senders with a flow in progress.
    async fn active_sessions(&self) -> usize;
}

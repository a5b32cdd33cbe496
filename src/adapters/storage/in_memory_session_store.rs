//! In-Memory Session Store Adapter
//!
//! Keeps conversation sessions in a map keyed by sender. Each sender gets its
//! own async mutex, created on first use and pruned by `purge_expired` once
//! nobody holds or waits for it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::domain::conversation::{ConversationState, Session};
use crate::domain::foundation::{SenderId, Timestamp};
use crate::ports::{SenderLock, SessionStore};

/// Sessions older than this are dropped when no TTL is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(600);

/// In-memory storage for conversation sessions
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SenderId, Session>>>,
    locks: Arc<Mutex<HashMap<SenderId, Arc<Mutex<()>>>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Create a store with the default session TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }

    /// Create a store whose sessions expire after `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of per-sender mutexes currently tracked
    pub async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn lock(&self, sender_id: &SenderId) -> SenderLock {
        let mutex = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(sender_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = mutex.lock_owned().await;
        SenderLock::new(sender_id.clone(), guard)
    }

    async fn get(&self, lock: &SenderLock) -> Option<Session> {
        let now = Timestamp::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(lock.sender_id())?.clone();
        if session.is_expired(self.ttl, &now) {
            tracing::debug!(
                sender = %lock.sender_id().masked(),
                "Session expired, treating sender as idle"
            );
            sessions.remove(lock.sender_id());
            return None;
        }
        Some(session)
    }

    async fn set(&self, lock: &SenderLock, state: ConversationState) {
        let mut sessions = self.sessions.write().await;
        if state.is_idle() {
            sessions.remove(lock.sender_id());
        } else {
            sessions.insert(
                lock.sender_id().clone(),
                Session::new(lock.sender_id().clone(), state),
            );
        }
    }

    async fn clear(&self, lock: &SenderLock) -> Option<Session> {
        self.sessions.write().await.remove(lock.sender_id())
    }

    async fn purge_expired(&self) -> usize {
        let now = Timestamp::now();
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, session| !session.is_expired(self.ttl, &now));
            before - sessions.len()
        };

        // Only the map holds an unused mutex; lock() clones under this same guard.
        let mut locks = self.locks.lock().await;
        locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);

        removed
    }

    async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

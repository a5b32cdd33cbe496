//! SessionSweeper - Background expiry of abandoned sessions.
//!
//! Senders who type `/timetable` and never answer would otherwise keep their
//! session forever. The sweeper purges expired sessions on a fixed interval;
//! reads already treat expired sessions as absent, so the sweeper only bounds
//! memory.
//!
//! ## Graceful Shutdown
//!
//! The sweeper listens for a shutdown signal and runs one final purge before
//! stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::ports::SessionStore;

/// Background service that purges expired sessions.
pub struct SessionSweeper {
    store: Arc<dyn SessionStore>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(store: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run the sweep loop until the shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender also means shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        self.sweep_once().await;
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// Purge once; returns how many sessions were removed.
    pub async fn sweep_once(&self) -> usize {
        let removed = self.store.purge_expired().await;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        removed
    }
}

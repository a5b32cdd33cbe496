//! Storage Adapters
//!
//! Implementations of the SessionStore and ArtifactStore ports.
//!
//! ## Available Adapters
//!
//! - **InMemorySessionStore** - Per-sender sessions in memory, with TTL
//! - **SessionSweeper** - Background purge of expired sessions
//! - **LocalArtifactStore** - Per-execution scratch directories on disk
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemorySessionStore, LocalArtifactStore};
//!
//! let sessions = InMemorySessionStore::with_ttl(Duration::from_secs(600));
//! let artifacts = LocalArtifactStore::new("/tmp/sheet-courier");
//! ```

mod in_memory_session_store;
mod local_artifact_store;
mod session_sweeper;

pub use in_memory_session_store::{InMemorySessionStore, DEFAULT_SESSION_TTL};
pub use local_artifact_store::{LocalArtifactScope, LocalArtifactStore, DEFAULT_ARTIFACT_BASENAME};
pub use session_sweeper::SessionSweeper;

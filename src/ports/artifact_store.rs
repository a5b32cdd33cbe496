//! Artifact Store Port - Scoped scratch space for generated files.
//!
//! Each flow execution acquires its own [`ArtifactScope`]. Every artifact
//! stored through the scope is removed when the scope is released, and
//! implementations must also remove them if the scope is dropped without
//! being released (a panicking or cancelled task).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::document::{Artifact, ArtifactRole, DocumentFormat};
use crate::domain::foundation::{ExecutionId, SenderId};

/// Errors that can occur while handling artifacts.
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("artifact {0} does not belong to this scope")]
    ForeignArtifact(String),
}

impl ArtifactError {
    pub fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        ArtifactError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// Port for acquiring per-execution artifact scopes.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Creates a fresh, uniquely named scope owned by `owner`.
    ///
    /// Names are unique per execution, so overlapping executions for
    /// different senders (or the same sender) never collide.
    async fn acquire(&self, owner: &SenderId) -> Result<Box<dyn ArtifactScope>, ArtifactError>;
}

/// Scratch space of one flow execution.
#[async_trait]
pub trait ArtifactScope: Send + Sync {
    fn execution_id(&self) -> ExecutionId;

    /// Writes `bytes` as a new artifact of the given role and format.
    async fn store(
        &mut self,
        role: ArtifactRole,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<Artifact, ArtifactError>;

    /// Reads an artifact created by this scope.
    async fn load(&self, artifact: &Artifact) -> Result<Vec<u8>, ArtifactError>;

    /// Artifacts created so far, in creation order.
    fn artifacts(&self) -> &[Artifact];

    /// Deletes every artifact of the scope.
    async fn release(self: Box<Self>) -> Result<(), ArtifactError>;
}

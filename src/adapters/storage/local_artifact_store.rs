//! Local Filesystem Artifact Store - Implementation of ArtifactStore.
//!
//! Every flow execution gets its own directory under the base path. Artifacts
//! are written inside it and the whole directory is removed on release.
//!
//! # Directory Structure
//!
//! ```text
//! {base_path}/
//! ├── 15551234567-1718000000000-3f2a9c1d/
//! │   ├── timetable-export.pdf
//! │   └── timetable.png
//! └── 15557654321-1718000000420-b81e07aa/
//!     └── timetable-export.pdf
//! ```
//!
//! The directory name combines the sender, the acquisition time in
//! milliseconds and the execution id, so concurrent executions never share
//! a file.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::document::{Artifact, ArtifactRole, DocumentFormat};
use crate::domain::foundation::{ExecutionId, SenderId, Timestamp};
use crate::ports::{ArtifactError, ArtifactScope, ArtifactStore};

/// Default file stem of generated artifacts.
pub const DEFAULT_ARTIFACT_BASENAME: &str = "timetable";

/// Local filesystem store for per-execution artifacts.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_path: PathBuf,
    basename: String,
}

impl LocalArtifactStore {
    /// Creates a store rooted at `base_path`.
    ///
    /// The directory is created lazily on first acquire.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            basename: DEFAULT_ARTIFACT_BASENAME.to_string(),
        }
    }

    /// Sets the file stem used for artifact names.
    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = basename.into();
        self
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn acquire(&self, owner: &SenderId) -> Result<Box<dyn ArtifactScope>, ArtifactError> {
        let execution_id = ExecutionId::new();
        let dir_name = format!(
            "{}-{}-{}",
            owner.file_safe(),
            Timestamp::now().as_unix_millis(),
            execution_id.short()
        );
        let dir = self.base_path.join(dir_name);

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ArtifactError::io(dir.display(), e))?;

        tracing::debug!(
            execution_id = %execution_id,
            dir = %dir.display(),
            "Acquired artifact scope"
        );

        Ok(Box::new(LocalArtifactScope {
            dir,
            basename: self.basename.clone(),
            owner: owner.clone(),
            execution_id,
            artifacts: Vec::new(),
            released: false,
        }))
    }
}

/// Directory-backed scope of one execution.
///
/// Removes its directory on release, and on drop when release never ran.
#[derive(Debug)]
pub struct LocalArtifactScope {
    dir: PathBuf,
    basename: String,
    owner: SenderId,
    execution_id: ExecutionId,
    artifacts: Vec<Artifact>,
    released: bool,
}

impl LocalArtifactScope {
    fn file_name(&self, role: ArtifactRole, format: DocumentFormat) -> String {
        match role {
            ArtifactRole::Intermediate => {
                format!("{}-export.{}", self.basename, format.extension())
            }
            ArtifactRole::Final => format!("{}.{}", self.basename, format.extension()),
        }
    }
}

#[async_trait]
impl ArtifactScope for LocalArtifactScope {
    fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    async fn store(
        &mut self,
        role: ArtifactRole,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<Artifact, ArtifactError> {
        let path = self.dir.join(self.file_name(role, format));

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| ArtifactError::io(path.display(), e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| ArtifactError::io(path.display(), e))?;
        file.flush()
            .await
            .map_err(|e| ArtifactError::io(path.display(), e))?;

        let artifact = Artifact {
            path,
            role,
            format,
            owner: self.owner.clone(),
            execution_id: self.execution_id,
        };
        self.artifacts.push(artifact.clone());
        Ok(artifact)
    }

    async fn load(&self, artifact: &Artifact) -> Result<Vec<u8>, ArtifactError> {
        if artifact.execution_id != self.execution_id || !artifact.path.starts_with(&self.dir) {
            return Err(ArtifactError::ForeignArtifact(
                artifact.path.display().to_string(),
            ));
        }
        fs::read(&artifact.path)
            .await
            .map_err(|e| ArtifactError::io(artifact.path.display(), e))
    }

    fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    async fn release(mut self: Box<Self>) -> Result<(), ArtifactError> {
        self.released = true;
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ArtifactError::io(self.dir.display(), e)),
        }
        tracing::debug!(
            execution_id = %self.execution_id,
            artifacts = self.artifacts.len(),
            "Released artifact scope"
        );
        Ok(())
    }
}

impl Drop for LocalArtifactScope {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Task was cancelled or panicked before release
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    dir = %self.dir.display(),
                    error = %e,
                    "Failed to remove artifact directory on drop"
                );
            }
        }
    }
}

//! Failure taxonomy of one flow execution.
//!
//! Every variant is caught at the orchestrator boundary, logged with the step
//! that failed, and turned into the generic failure text for the sender.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why an external step failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepFailure {
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

impl StepFailure {
    pub fn failed(message: impl Into<String>) -> Self {
        StepFailure::Failed(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StepFailure::Timeout(_))
    }
}

/// Steps of the document pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    /// Clear-then-write of the captured input into the target cell.
    WriteInput,
    /// Render the sheet region to the intermediate document.
    Export,
    /// Convert the intermediate document to the delivery format.
    Convert,
    /// Persist an artifact to the execution's scratch directory.
    StoreArtifact,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::WriteInput => "write_input",
            PipelineStep::Export => "export",
            PipelineStep::Convert => "convert",
            PipelineStep::StoreArtifact => "store_artifact",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline step failed; the remaining steps did not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pipeline step '{step}' failed: {failure}")]
pub struct PipelineStepError {
    pub step: PipelineStep,
    pub failure: StepFailure,
}

impl PipelineStepError {
    pub fn new(step: PipelineStep, failure: StepFailure) -> Self {
        Self { step, failure }
    }
}

/// Stages of delivering an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStage {
    /// Loading the artifact bytes from disk.
    ReadArtifact,
    /// Uploading the media to obtain a reference id.
    Upload,
    /// Sending the message that carries the text or media reference.
    Send,
}

impl DeliveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStage::ReadArtifact => "read_artifact",
            DeliveryStage::Upload => "upload",
            DeliveryStage::Send => "send",
        }
    }
}

impl fmt::Display for DeliveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sending something to the sender failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delivery stage '{stage}' failed: {failure}")]
pub struct DeliveryError {
    pub stage: DeliveryStage,
    pub failure: StepFailure,
}

impl DeliveryError {
    pub fn new(stage: DeliveryStage, failure: StepFailure) -> Self {
        Self { stage, failure }
    }
}

/// Any failure of one flow execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Pipeline(#[from] PipelineStepError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The scratch directory for the execution could not be prepared.
    #[error("artifact workspace unavailable: {0}")]
    Workspace(String),
}

impl FlowError {
    /// Identity of the failing step, for structured logs.
    pub fn stage_name(&self) -> &'static str {
        match self {
            FlowError::Pipeline(e) => e.step.as_str(),
            FlowError::Delivery(e) => e.stage.as_str(),
            FlowError::Workspace(_) => "acquire_workspace",
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            FlowError::Pipeline(e) => e.failure.is_timeout(),
            FlowError::Delivery(e) => e.failure.is_timeout(),
            FlowError::Workspace(_) => false,
        }
    }
}

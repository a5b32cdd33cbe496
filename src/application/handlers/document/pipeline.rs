//! DocumentPipeline - Turns a captured input into a deliverable artifact.
//!
//! Three external steps run in order, each bounded by the step timeout:
//!
//! 1. Clear and write the input cell.
//! 2. Export the configured region as a single-page PDF.
//! 3. Convert the PDF to the delivery format (first page only).
//!
//! Both the export and the converted document are stored in the caller's
//! artifact scope, so whatever was produced before a failure is released with
//! the scope.
//!
//! Every execution writes the same input cell, so steps 1 and 2 run under a
//! lock shared by all clones of the pipeline. Conversion runs outside it.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::domain::conversation::{CapturedInput, PipelineStep, PipelineStepError, StepFailure};
use crate::domain::document::{
    Artifact, ArtifactRole, CellLocation, DocumentFormat, ExportRegion, PageLayout,
};
use crate::ports::{ArtifactScope, FormatConverter, SpreadsheetService};

/// Format the spreadsheet export produces.
pub const EXPORT_FORMAT: DocumentFormat = DocumentFormat::Pdf;

/// Where the input goes, what gets rendered, and how it is delivered.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub input_cell: CellLocation,
    pub region: ExportRegion,
    pub layout: PageLayout,
    /// Final format; `Pdf` delivers the export itself.
    pub delivery_format: DocumentFormat,
    pub step_timeout: Duration,
}

/// Runs the write, export, convert sequence.
#[derive(Clone)]
pub struct DocumentPipeline {
    spreadsheet: Arc<dyn SpreadsheetService>,
    converter: Arc<dyn FormatConverter>,
    settings: PipelineSettings,
    /// Held from writing the input cell until its export is back.
    sheet_lock: Arc<Mutex<()>>,
}

impl DocumentPipeline {
    pub fn new(
        spreadsheet: Arc<dyn SpreadsheetService>,
        converter: Arc<dyn FormatConverter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            spreadsheet,
            converter,
            settings,
            sheet_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Produces the final artifact for `input` inside `scope`.
    pub async fn run(
        &self,
        input: &CapturedInput,
        scope: &mut dyn ArtifactScope,
    ) -> Result<Artifact, PipelineStepError> {
        let execution_id = scope.execution_id();

        let exported = {
            let waited = Instant::now();
            let _sheet = self.sheet_lock.lock().await;
            tracing::debug!(
                execution_id = %execution_id,
                waited_ms = waited.elapsed().as_millis() as u64,
                "Acquired spreadsheet"
            );

            self.bounded(
                PipelineStep::WriteInput,
                self.spreadsheet
                    .clear_and_write(&self.settings.input_cell, &input.value),
            )
            .await?;

            self.bounded(
                PipelineStep::Export,
                self.spreadsheet
                    .export_region(&self.settings.region, &self.settings.layout),
            )
            .await?
        };

        self.bounded(
            PipelineStep::StoreArtifact,
            scope.store(ArtifactRole::Intermediate, EXPORT_FORMAT, &exported),
        )
        .await?;

        let converted = self
            .bounded(
                PipelineStep::Convert,
                self.converter
                    .convert(exported, EXPORT_FORMAT, self.settings.delivery_format),
            )
            .await?;

        let artifact = self
            .bounded(
                PipelineStep::StoreArtifact,
                scope.store(ArtifactRole::Final, self.settings.delivery_format, &converted),
            )
            .await?;

        tracing::debug!(
            execution_id = %execution_id,
            format = %artifact.format,
            bytes = converted.len(),
            "Pipeline produced artifact"
        );
        Ok(artifact)
    }

    /// Awaits one step under the step timeout, tagging failures with the step.
    async fn bounded<T, E, F>(&self, step: PipelineStep, fut: F) -> Result<T, PipelineStepError>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.settings.step_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineStepError::new(step, StepFailure::failed(e.to_string()))),
            Err(_) => Err(PipelineStepError::new(
                step,
                StepFailure::Timeout(self.settings.step_timeout),
            )),
        };
        tracing::debug!(
            step = %step,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Pipeline step finished"
        );
        result
    }
}

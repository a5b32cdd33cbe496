//! ConversationOrchestrator - Drives one sender's conversation per inbound message.
//!
//! The stored state is read, the transition decided and the next state written
//! while the sender's lock is held. The lock is released before any network
//! call, so a second message from the same sender arriving mid-pipeline sees
//! an idle session and gets the help text instead of starting a second run.
//!
//! Failures never escape: they are logged with the failing stage and the
//! sender receives the configured failure text.

use std::sync::Arc;
use std::time::Instant;

use crate::application::handlers::document::{DocumentPipeline, OutboundMessenger};
use crate::domain::conversation::{
    CapturedInput, ConversationState, DeliveryError, FlowAction, FlowError, StartCommand,
};
use crate::domain::foundation::{ExecutionId, SenderId};
use crate::domain::webhook::InboundMessage;
use crate::ports::{ArtifactScope, ArtifactStore, SessionStore};

/// Texts sent to the sender.
#[derive(Debug, Clone)]
pub struct ConversationTexts {
    pub prompt: String,
    pub help: String,
    pub failure: String,
    /// Caption attached to the delivered document.
    pub media_caption: Option<String>,
}

impl Default for ConversationTexts {
    fn default() -> Self {
        Self {
            prompt: "Which teacher's timetable would you like? Reply with their name.".to_string(),
            help: "Send /timetable to request a teacher's timetable.".to_string(),
            failure: "Sorry, something went wrong while preparing the timetable. Please try again."
                .to_string(),
            media_caption: None,
        }
    }
}

/// Behaviour of the conversation flow.
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub start_command: StartCommand,
    /// Name of the single input the flow collects.
    pub input_field: String,
    pub texts: ConversationTexts,
}

/// What handling one inbound message amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// A flow started and the prompt went out.
    Prompted,
    /// No flow in progress; the help text went out.
    HelpSent,
    /// The pipeline ran and the document was delivered.
    Delivered { execution_id: ExecutionId },
    /// The flow failed at `stage`; `notified` is false if the failure text
    /// could not be sent either.
    Failed { stage: &'static str, notified: bool },
    /// The prompt or help text could not be sent.
    ReplyFailed { error: DeliveryError },
}

/// Applies inbound text messages to per-sender conversation state.
pub struct ConversationOrchestrator {
    sessions: Arc<dyn SessionStore>,
    artifacts: Arc<dyn ArtifactStore>,
    pipeline: DocumentPipeline,
    messenger: OutboundMessenger,
    settings: ConversationSettings,
}

impl ConversationOrchestrator {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        artifacts: Arc<dyn ArtifactStore>,
        pipeline: DocumentPipeline,
        messenger: OutboundMessenger,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            sessions,
            artifacts,
            pipeline,
            messenger,
            settings,
        }
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub async fn handle_inbound(&self, message: InboundMessage) -> InboundOutcome {
        let sender = message.sender_id.clone();

        let action = {
            let lock = self.sessions.lock(&sender).await;
            let current = self
                .sessions
                .get(&lock)
                .await
                .map(|session| session.state)
                .unwrap_or_default();

            let transition = current.on_message(
                &message.text,
                &self.settings.start_command,
                &self.settings.input_field,
            );
            self.sessions.set(&lock, transition.next_state).await;

            tracing::info!(
                sender = %sender.masked(),
                message_id = message.message_id.as_deref().unwrap_or(""),
                from = %transition.from,
                to = %transition.to,
                "Conversation transition"
            );
            transition.action
        };

        match action {
            FlowAction::SendPrompt => self.send_prompt(&sender).await,
            FlowAction::SendHelp => {
                match self.messenger.send_text(&sender, &self.settings.texts.help).await {
                    Ok(_) => InboundOutcome::HelpSent,
                    Err(error) => {
                        tracing::warn!(sender = %sender.masked(), error = %error, "Failed to send help text");
                        InboundOutcome::ReplyFailed { error }
                    }
                }
            }
            FlowAction::RunPipeline(input) => self.run_flow(&sender, input).await,
        }
    }

    /// Sends the prompt; if it never arrives the sender is put back to idle so
    /// the next message is not mistaken for the input.
    async fn send_prompt(&self, sender: &SenderId) -> InboundOutcome {
        match self.messenger.send_text(sender, &self.settings.texts.prompt).await {
            Ok(_) => InboundOutcome::Prompted,
            Err(error) => {
                tracing::warn!(sender = %sender.masked(), error = %error, "Failed to send prompt");
                let lock = self.sessions.lock(sender).await;
                let still_awaiting = self
                    .sessions
                    .get(&lock)
                    .await
                    .map(|s| matches!(s.state, ConversationState::AwaitingInput { .. }))
                    .unwrap_or(false);
                if still_awaiting {
                    self.sessions.clear(&lock).await;
                }
                InboundOutcome::ReplyFailed { error }
            }
        }
    }

    async fn run_flow(&self, sender: &SenderId, input: CapturedInput) -> InboundOutcome {
        let started = Instant::now();
        let mut scope = match self.artifacts.acquire(sender).await {
            Ok(scope) => scope,
            Err(e) => {
                return self
                    .report_failure(sender, None, FlowError::Workspace(e.to_string()))
                    .await
            }
        };
        let execution_id = scope.execution_id();

        tracing::info!(
            sender = %sender.masked(),
            execution_id = %execution_id,
            field = %input.field,
            "Starting document pipeline"
        );

        let result = self.produce_and_deliver(sender, &input, scope.as_mut()).await;

        if let Err(e) = scope.release().await {
            tracing::warn!(execution_id = %execution_id, error = %e, "Failed to release artifacts");
        }

        match result {
            Ok(()) => {
                tracing::info!(
                    sender = %sender.masked(),
                    execution_id = %execution_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Document delivered"
                );
                InboundOutcome::Delivered { execution_id }
            }
            Err(err) => self.report_failure(sender, Some(execution_id), err).await,
        }
    }

    async fn produce_and_deliver(
        &self,
        sender: &SenderId,
        input: &CapturedInput,
        scope: &mut dyn ArtifactScope,
    ) -> Result<(), FlowError> {
        let artifact = self.pipeline.run(input, scope).await?;
        self.messenger
            .send_media(
                sender,
                &artifact,
                scope,
                self.settings.texts.media_caption.as_deref(),
            )
            .await?;
        Ok(())
    }

    async fn report_failure(
        &self,
        sender: &SenderId,
        execution_id: Option<ExecutionId>,
        err: FlowError,
    ) -> InboundOutcome {
        let stage = err.stage_name();
        tracing::error!(
            sender = %sender.masked(),
            execution_id = execution_id.map(|id| id.to_string()).as_deref().unwrap_or(""),
            stage,
            timeout = err.is_timeout(),
            error = %err,
            "Conversation flow failed"
        );

        let notified = match self.messenger.send_text(sender, &self.settings.texts.failure).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(sender = %sender.masked(), error = %e, "Failed to send failure text");
                false
            }
        };
        InboundOutcome::Failed { stage, notified }
    }
}

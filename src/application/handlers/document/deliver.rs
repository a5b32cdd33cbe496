//! OutboundMessenger - Best-effort delivery to a sender.
//!
//! Media delivery is two platform calls (upload, then send) treated as one
//! operation: either failure is a `DeliveryError` and neither is retried.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::conversation::{DeliveryError, DeliveryStage, StepFailure};
use crate::domain::document::Artifact;
use crate::domain::foundation::SenderId;
use crate::ports::{ArtifactScope, MessagingPlatform, OutboundPayload, SentMessage, TemplateMessage};

/// Sends texts, artifacts and templates through the messaging platform.
#[derive(Clone)]
pub struct OutboundMessenger {
    platform: Arc<dyn MessagingPlatform>,
    step_timeout: Duration,
}

impl OutboundMessenger {
    pub fn new(platform: Arc<dyn MessagingPlatform>, step_timeout: Duration) -> Self {
        Self {
            platform,
            step_timeout,
        }
    }

    pub async fn send_text(&self, to: &SenderId, body: &str) -> Result<SentMessage, DeliveryError> {
        self.bounded(
            DeliveryStage::Send,
            self.platform.send_message(to, OutboundPayload::text(body)),
        )
        .await
    }

    /// Uploads the artifact and sends it as an image or a document.
    pub async fn send_media(
        &self,
        to: &SenderId,
        artifact: &Artifact,
        scope: &dyn ArtifactScope,
        caption: Option<&str>,
    ) -> Result<SentMessage, DeliveryError> {
        let bytes = self
            .bounded(DeliveryStage::ReadArtifact, scope.load(artifact))
            .await?;

        let file_name = artifact.file_name();
        let media = self
            .bounded(
                DeliveryStage::Upload,
                self.platform
                    .upload_media(bytes, artifact.format.mime_type(), &file_name),
            )
            .await?;

        let caption = caption.map(str::to_string);
        let payload = if artifact.format.is_image() {
            OutboundPayload::Image { media, caption }
        } else {
            OutboundPayload::Document {
                media,
                filename: file_name,
                caption,
            }
        };

        self.bounded(DeliveryStage::Send, self.platform.send_message(to, payload))
            .await
    }

    pub async fn send_template(
        &self,
        to: &SenderId,
        template: TemplateMessage,
    ) -> Result<SentMessage, DeliveryError> {
        self.bounded(
            DeliveryStage::Send,
            self.platform.send_template(to, template),
        )
        .await
    }

    async fn bounded<T, E, F>(&self, stage: DeliveryStage, fut: F) -> Result<T, DeliveryError>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DeliveryError::new(stage, StepFailure::failed(e.to_string()))),
            Err(_) => Err(DeliveryError::new(
                stage,
                StepFailure::Timeout(self.step_timeout),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalArtifactStore;
    use crate::adapters::whatsapp::MockMessagingPlatform;
    use crate::domain::document::{ArtifactRole, DocumentFormat};
    use crate::ports::{ArtifactStore, MessagingError};
    use tempfile::TempDir;

    fn sender() -> SenderId {
        SenderId::new("15551234567").unwrap()
    }

    fn messenger(platform: &MockMessagingPlatform) -> OutboundMessenger {
        OutboundMessenger::new(Arc::new(platform.clone()), Duration::from_secs(5))
    }

    async fn stored(
        temp: &TempDir,
        format: DocumentFormat,
    ) -> (Box<dyn ArtifactScope>, Artifact) {
        let mut scope = LocalArtifactStore::new(temp.path())
            .acquire(&sender())
            .await
            .unwrap();
        let artifact = scope
            .store(ArtifactRole::Final, format, b"bytes")
            .await
            .unwrap();
        (scope, artifact)
    }

    #[tokio::test]
    async fn send_text_records_message() {
        let platform = MockMessagingPlatform::new();

        messenger(&platform)
            .send_text(&sender(), "Which teacher?")
            .await
            .unwrap();

        assert_eq!(platform.texts_to(&sender()), vec!["Which teacher?"]);
    }

    #[tokio::test]
    async fn png_is_sent_as_image() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();
        let (scope, artifact) = stored(&temp, DocumentFormat::Png).await;

        messenger(&platform)
            .send_media(&sender(), &artifact, scope.as_ref(), Some("Here you go"))
            .await
            .unwrap();

        let uploads = platform.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].mime_type, "image/png");
        assert_eq!(uploads[0].bytes, b"bytes");
        assert_eq!(
            platform.media_to(&sender()),
            vec![OutboundPayload::Image {
                media: uploads[0].media.clone(),
                caption: Some("Here you go".to_string()),
            }]
        );
        scope.release().await.unwrap();
    }

    #[tokio::test]
    async fn pdf_is_sent_as_document_with_filename() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();
        let (scope, artifact) = stored(&temp, DocumentFormat::Pdf).await;

        messenger(&platform)
            .send_media(&sender(), &artifact, scope.as_ref(), None)
            .await
            .unwrap();

        match &platform.media_to(&sender())[0] {
            OutboundPayload::Document { filename, .. } => assert_eq!(filename, "timetable.pdf"),
            other => panic!("expected document, got {:?}", other),
        }
        scope.release().await.unwrap();
    }

    #[tokio::test]
    async fn upload_failure_skips_send() {
        let temp = TempDir::new().unwrap();
        let platform =
            MockMessagingPlatform::new().with_upload_error(MessagingError::api(500, "down"));
        let (scope, artifact) = stored(&temp, DocumentFormat::Png).await;

        let err = messenger(&platform)
            .send_media(&sender(), &artifact, scope.as_ref(), None)
            .await
            .unwrap_err();

        assert_eq!(err.stage, DeliveryStage::Upload);
        assert_eq!(platform.sent_count(), 0);
        scope.release().await.unwrap();
    }

    #[tokio::test]
    async fn send_failure_after_upload_is_delivery_error() {
        let temp = TempDir::new().unwrap();
        let platform =
            MockMessagingPlatform::new().with_send_error(MessagingError::network("reset"));
        let (scope, artifact) = stored(&temp, DocumentFormat::Png).await;

        let err = messenger(&platform)
            .send_media(&sender(), &artifact, scope.as_ref(), None)
            .await
            .unwrap_err();

        assert_eq!(err.stage, DeliveryStage::Send);
        assert_eq!(platform.uploads().len(), 1);
        scope.release().await.unwrap();
    }

    #[tokio::test]
    async fn slow_platform_times_out() {
        let platform = MockMessagingPlatform::new().with_delay(Duration::from_secs(5));
        let messenger = OutboundMessenger::new(Arc::new(platform), Duration::from_millis(50));

        let err = messenger.send_text(&sender(), "hi").await.unwrap_err();

        assert_eq!(err.stage, DeliveryStage::Send);
        assert!(err.failure.is_timeout());
    }
}

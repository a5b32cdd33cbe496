//! Mock messaging platform for testing.
//!
//! Provides a configurable mock implementation of `MessagingPlatform` for unit
//! and integration tests. Supports:
//! - Error injection per operation (consumed in order)
//! - Simulated latency
//! - Call tracking, including a per-recipient transcript

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::domain::foundation::SenderId;
use crate::ports::{
    MediaRef, MessagingError, MessagingPlatform, OutboundPayload, SentMessage, TemplateMessage,
};

/// Recorded media upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub media: MediaRef,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

/// Recorded outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentRecord {
    Message {
        to: SenderId,
        payload: OutboundPayload,
    },
    Template {
        to: SenderId,
        template: TemplateMessage,
    },
}

impl SentRecord {
    pub fn recipient(&self) -> &SenderId {
        match self {
            SentRecord::Message { to, .. } | SentRecord::Template { to, .. } => to,
        }
    }
}

/// Mock messaging platform for testing.
///
/// # Example
///
/// ```ignore
/// let platform = MockMessagingPlatform::new()
///     .with_upload_error(MessagingError::api(500, "media store down"));
///
/// orchestrator.handle_inbound(message).await;
/// assert_eq!(platform.texts_to(&sender), vec!["Sorry..."]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockMessagingPlatform {
    uploads: Arc<Mutex<Vec<UploadedMedia>>>,
    sent: Arc<Mutex<Vec<SentRecord>>>,
    upload_errors: Arc<Mutex<VecDeque<MessagingError>>>,
    send_errors: Arc<Mutex<VecDeque<MessagingError>>>,
    delay: Duration,
    next_id: Arc<AtomicU64>,
}

impl MockMessagingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an error for the next upload.
    pub fn with_upload_error(self, error: MessagingError) -> Self {
        self.fail_next_upload(error);
        self
    }

    /// Queues an error for the next message or template send.
    pub fn with_send_error(self, error: MessagingError) -> Self {
        self.fail_next_send(error);
        self
    }

    /// Queues an upload error on a platform already handed out.
    ///
    /// Clones share their queues, so the error reaches whoever uploads next.
    pub fn fail_next_upload(&self, error: MessagingError) {
        self.upload_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Queues a send error on a platform already handed out.
    pub fn fail_next_send(&self, error: MessagingError) {
        self.send_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn uploads(&self) -> Vec<UploadedMedia> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Everything delivered to one recipient, in order.
    pub fn sent_to(&self, to: &SenderId) -> Vec<SentRecord> {
        self.sent()
            .into_iter()
            .filter(|r| r.recipient() == to)
            .collect()
    }

    /// Text bodies delivered to one recipient, in order.
    pub fn texts_to(&self, to: &SenderId) -> Vec<String> {
        self.sent_to(to)
            .into_iter()
            .filter_map(|r| match r {
                SentRecord::Message {
                    payload: OutboundPayload::Text { body },
                    ..
                } => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Media messages delivered to one recipient, in order.
    pub fn media_to(&self, to: &SenderId) -> Vec<OutboundPayload> {
        self.sent_to(to)
            .into_iter()
            .filter_map(|r| match r {
                SentRecord::Message { payload, .. } if payload.kind() != "text" => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    fn take_send_error(&self) -> Option<MessagingError> {
        self.send_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

#[async_trait]
impl MessagingPlatform for MockMessagingPlatform {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<MediaRef, MessagingError> {
        self.simulate_latency().await;

        let queued = self
            .upload_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = queued {
            return Err(error);
        }

        let media = MediaRef::new(self.next_id("media"));
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(UploadedMedia {
                media: media.clone(),
                bytes,
                mime_type: mime_type.to_string(),
                filename: filename.to_string(),
            });
        Ok(media)
    }

    async fn send_message(
        &self,
        to: &SenderId,
        payload: OutboundPayload,
    ) -> Result<SentMessage, MessagingError> {
        self.simulate_latency().await;

        if let Some(error) = self.take_send_error() {
            return Err(error);
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentRecord::Message {
                to: to.clone(),
                payload,
            });
        Ok(SentMessage {
            message_id: self.next_id("wamid"),
        })
    }

    async fn send_template(
        &self,
        to: &SenderId,
        template: TemplateMessage,
    ) -> Result<SentMessage, MessagingError> {
        self.simulate_latency().await;

        if let Some(error) = self.take_send_error() {
            return Err(error);
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentRecord::Template {
                to: to.clone(),
                template,
            });
        Ok(SentMessage {
            message_id: self.next_id("wamid"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(id: &str) -> SenderId {
        SenderId::new(id).unwrap()
    }

    #[tokio::test]
    async fn records_texts_per_recipient() {
        let platform = MockMessagingPlatform::new();

        platform
            .send_message(&sender("1"), OutboundPayload::text("a"))
            .await
            .unwrap();
        platform
            .send_message(&sender("2"), OutboundPayload::text("b"))
            .await
            .unwrap();

        assert_eq!(platform.texts_to(&sender("1")), vec!["a"]);
        assert_eq!(platform.texts_to(&sender("2")), vec!["b"]);
        assert_eq!(platform.sent_count(), 2);
    }

    #[tokio::test]
    async fn upload_assigns_distinct_ids() {
        let platform = MockMessagingPlatform::new();

        let a = platform.upload_media(vec![1], "image/png", "a.png").await.unwrap();
        let b = platform.upload_media(vec![2], "image/png", "b.png").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(platform.uploads().len(), 2);
        assert_eq!(platform.uploads()[0].filename, "a.png");
    }

    #[tokio::test]
    async fn injected_errors_are_consumed() {
        let platform = MockMessagingPlatform::new()
            .with_upload_error(MessagingError::api(500, "down"))
            .with_send_error(MessagingError::network("reset"));

        assert!(platform.upload_media(vec![], "image/png", "a").await.is_err());
        assert!(platform.upload_media(vec![], "image/png", "a").await.is_ok());
        assert!(platform
            .send_message(&sender("1"), OutboundPayload::text("x"))
            .await
            .is_err());
        assert!(platform
            .send_message(&sender("1"), OutboundPayload::text("x"))
            .await
            .is_ok());
        assert_eq!(platform.texts_to(&sender("1")), vec!["x"]);
    }

    #[tokio::test]
    async fn failure_queued_on_a_clone_reaches_the_original() {
        let platform = MockMessagingPlatform::new();
        let handed_out = platform.clone();

        platform.fail_next_send(MessagingError::network("reset"));

        assert!(handed_out
            .send_message(&sender("1"), OutboundPayload::text("x"))
            .await
            .is_err());
        assert!(handed_out
            .send_message(&sender("1"), OutboundPayload::text("y"))
            .await
            .is_ok());
        assert_eq!(platform.texts_to(&sender("1")), vec!["y"]);
    }

    #[tokio::test]
    async fn media_to_skips_texts() {
        let platform = MockMessagingPlatform::new();
        let to = sender("1");
        platform.send_message(&to, OutboundPayload::text("t")).await.unwrap();
        platform
            .send_message(
                &to,
                OutboundPayload::Image {
                    media: MediaRef::new("m"),
                    caption: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(platform.media_to(&to).len(), 1);
    }
}

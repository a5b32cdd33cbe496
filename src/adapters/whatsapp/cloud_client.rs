//! WhatsApp Cloud API client - Implementation of MessagingPlatform.
//!
//! # Configuration
//!
//! ```ignore
//! let config = WhatsAppConfig::new(access_token, "106540352242922")
//!     .with_api_version("v20.0");
//!
//! let client = WhatsAppCloudClient::new(config)?;
//! ```
//!
//! # Endpoints
//!
//! - `POST /{version}/{phone_number_id}/media` (multipart) returns `{ "id": ... }`
//! - `POST /{version}/{phone_number_id}/messages` (JSON) returns
//!   `{ "messages": [ { "id": "wamid..." } ] }`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::foundation::SenderId;
use crate::ports::{
    MediaRef, MessagingError, MessagingPlatform, OutboundPayload, SentMessage, TemplateMessage,
};

pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v20.0";

/// Configuration for the WhatsApp Cloud API client.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    access_token: Secret<String>,
    /// Business phone number the service sends from.
    pub phone_number_id: String,
    pub api_base_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl WhatsAppConfig {
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            phone_number_id: phone_number_id.into(),
            api_base_url: DEFAULT_GRAPH_API_URL.to_string(),
            api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_version,
            self.phone_number_id,
            resource
        )
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<MessageIdResponse>,
}

#[derive(Debug, Deserialize)]
struct MessageIdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// WhatsApp Cloud API implementation of [`MessagingPlatform`].
pub struct WhatsAppCloudClient {
    config: WhatsAppConfig,
    client: Client,
}

impl WhatsAppCloudClient {
    pub fn new(config: WhatsAppConfig) -> Result<Self, MessagingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MessagingError::network(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn map_send_error(&self, e: reqwest::Error) -> MessagingError {
        if e.is_timeout() {
            MessagingError::network(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs()
            ))
        } else if e.is_connect() {
            MessagingError::network(format!("connection failed: {}", e))
        } else {
            MessagingError::network(e.to_string())
        }
    }

    async fn check_status(response: Response) -> Result<Response, MessagingError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body);
        match status.as_u16() {
            401 => Err(MessagingError::Unauthorized(message)),
            code => Err(MessagingError::api(code, message)),
        }
    }

    async fn post_message(&self, body: Value) -> Result<SentMessage, MessagingError> {
        let response = self
            .client
            .post(self.config.endpoint("messages"))
            .bearer_auth(self.config.access_token())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::InvalidResponse(e.to_string()))?;
        let message_id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| MessagingError::InvalidResponse("no message id returned".into()))?;

        Ok(SentMessage { message_id })
    }
}

/// Human-readable message from a Graph API error body.
fn parse_error_message(body: &str) -> String {
    match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.code {
            Some(code) => format!("{} (code {})", envelope.error.message, code),
            None => envelope.error.message,
        },
        Err(_) => body.to_string(),
    }
}

/// JSON body of a text or media message.
pub(crate) fn message_body(to: &SenderId, payload: &OutboundPayload) -> Value {
    let mut body = json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to.as_str(),
        "type": payload.kind(),
    });

    let content = match payload {
        OutboundPayload::Text { body } => json!({ "preview_url": false, "body": body }),
        OutboundPayload::Image { media, caption } => {
            let mut image = json!({ "id": media.as_str() });
            if let Some(caption) = caption {
                image["caption"] = json!(caption);
            }
            image
        }
        OutboundPayload::Document {
            media,
            filename,
            caption,
        } => {
            let mut document = json!({ "id": media.as_str(), "filename": filename });
            if let Some(caption) = caption {
                document["caption"] = json!(caption);
            }
            document
        }
    };
    body[payload.kind()] = content;
    body
}

/// JSON body of a template message.
pub(crate) fn template_body(to: &SenderId, template: &TemplateMessage) -> Value {
    let mut content = json!({
        "name": template.name,
        "language": { "code": template.language },
    });
    if !template.parameters.is_empty() {
        let parameters: Vec<Value> = template
            .parameters
            .iter()
            .map(|p| json!({ "type": "text", "text": p }))
            .collect();
        content["components"] = json!([{ "type": "body", "parameters": parameters }]);
    }

    json!({
        "messaging_product": "whatsapp",
        "to": to.as_str(),
        "type": "template",
        "template": content,
    })
}

#[async_trait]
impl MessagingPlatform for WhatsAppCloudClient {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        filename: &str,
    ) -> Result<MediaRef, MessagingError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| MessagingError::InvalidResponse(format!("invalid MIME type: {}", e)))?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime_type.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.config.endpoint("media"))
            .bearer_auth(self.config.access_token())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::InvalidResponse(e.to_string()))?;

        tracing::debug!(media_id = %uploaded.id, bytes = size, mime = mime_type, "Uploaded media");
        Ok(MediaRef::new(uploaded.id))
    }

    async fn send_message(
        &self,
        to: &SenderId,
        payload: OutboundPayload,
    ) -> Result<SentMessage, MessagingError> {
        let sent = self.post_message(message_body(to, &payload)).await?;
        tracing::debug!(
            to = %to.masked(),
            kind = payload.kind(),
            message_id = %sent.message_id,
            "Sent message"
        );
        Ok(sent)
    }

    async fn send_template(
        &self,
        to: &SenderId,
        template: TemplateMessage,
    ) -> Result<SentMessage, MessagingError> {
        let sent = self.post_message(template_body(to, &template)).await?;
        tracing::debug!(
            to = %to.masked(),
            template = %template.name,
            message_id = %sent.message_id,
            "Sent template message"
        );
        Ok(sent)
    }
}

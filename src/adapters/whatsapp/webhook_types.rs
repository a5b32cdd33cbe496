//! WhatsApp Cloud API webhook payload types.
//!
//! These types represent the notification JSON as it arrives on
//! `POST /webhook`. They are designed to:
//! - Tolerate every notification kind (messages, status callbacks, unknown fields)
//! - Map text-bearing messages to domain `InboundMessage`s
//! - Report everything else as `MalformedPayload`

use serde::Deserialize;

use crate::domain::foundation::{SenderId, Timestamp};
use crate::domain::webhook::{InboundMessage, MalformedPayload};

// ════════════════════════════════════════════════════════════════════════════════
// Notification Envelope
// ════════════════════════════════════════════════════════════════════════════════

/// Top-level webhook notification.
///
/// ```text
/// { "object": "whatsapp_business_account",
///   "entry": [ { "changes": [ { "value": { "messages": [ ... ] } } ] } ] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,

    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,

    /// Delivery/read receipts for messages we sent; never acted upon.
    #[serde(default)]
    pub statuses: Vec<serde_json::Value>,
}

impl WebhookPayload {
    /// Parses a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, MalformedPayload> {
        serde_json::from_slice(body).map_err(|e| MalformedPayload::InvalidJson(e.to_string()))
    }

    /// Every message of every change of every entry, in order.
    pub fn messages(&self) -> impl Iterator<Item = &WebhookMessage> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .flat_map(|c| c.value.messages.iter())
    }

    /// Number of status callbacks in the notification.
    pub fn status_count(&self) -> usize {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .map(|c| c.value.statuses.len())
            .sum()
    }

    /// Maps each message to an inbound message or the reason it is unusable.
    pub fn inbound_messages(&self) -> Vec<Result<InboundMessage, MalformedPayload>> {
        self.messages().map(WebhookMessage::to_inbound).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Messages
// ════════════════════════════════════════════════════════════════════════════════

/// One message of a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub id: Option<String>,

    /// Unix seconds, sent as a string.
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub text: Option<TextContent>,

    /// Quick-reply button of a template message.
    #[serde(default)]
    pub button: Option<ButtonContent>,

    #[serde(default)]
    pub interactive: Option<InteractiveContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ButtonContent {
    pub text: String,

    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractiveContent {
    #[serde(default)]
    pub button_reply: Option<ReplyContent>,

    #[serde(default)]
    pub list_reply: Option<ReplyContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyContent {
    #[serde(default)]
    pub id: Option<String>,

    pub title: String,
}

impl WebhookMessage {
    /// Text the sender typed or tapped, if the message carries any.
    pub fn text_content(&self) -> Option<&str> {
        if let Some(text) = &self.text {
            return Some(&text.body);
        }
        if let Some(button) = &self.button {
            return Some(&button.text);
        }
        let interactive = self.interactive.as_ref()?;
        interactive
            .button_reply
            .as_ref()
            .or(interactive.list_reply.as_ref())
            .map(|r| r.title.as_str())
    }

    pub fn to_inbound(&self) -> Result<InboundMessage, MalformedPayload> {
        let from = self
            .from
            .as_deref()
            .ok_or(MalformedPayload::MissingField("from"))?;
        let sender = SenderId::new(from)?;

        let text = self.text_content().ok_or_else(|| {
            MalformedPayload::UnsupportedMessageType(
                self.kind.clone().unwrap_or_else(|| "unknown".to_string()),
            )
        })?;

        let mut message = InboundMessage::new(sender, text);
        if let Some(received_at) = self
            .timestamp
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok())
            .and_then(Timestamp::from_unix_secs)
        {
            message = message.with_received_at(received_at);
        }
        if let Some(id) = &self.id {
            message = message.with_message_id(id.clone());
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(messages: &str) -> WebhookPayload {
        let body = format!(
            r#"{{
                "object": "whatsapp_business_account",
                "entry": [{{
                    "id": "102290129340398",
                    "changes": [{{
                        "field": "messages",
                        "value": {{
                            "messaging_product": "whatsapp",
                            "metadata": {{ "phone_number_id": "106540352242922" }},
                            "messages": {}
                        }}
                    }}]
                }}]
            }}"#,
            messages
        );
        WebhookPayload::parse(body.as_bytes()).unwrap()
    }

    #[test]
    fn parses_text_message() {
        let p = payload(
            r#"[{ "from": "15551234567", "id": "wamid.A", "timestamp": "1718000000",
                  "type": "text", "text": { "body": "/timetable" } }]"#,
        );

        let inbound = p.inbound_messages();
        assert_eq!(inbound.len(), 1);
        let msg = inbound[0].as_ref().unwrap();
        assert_eq!(msg.sender_id.as_str(), "15551234567");
        assert_eq!(msg.text, "/timetable");
        assert_eq!(msg.message_id.as_deref(), Some("wamid.A"));
        assert_eq!(msg.received_at.as_unix_millis(), 1_718_000_000_000);
    }

    #[test]
    fn takes_text_from_buttons_and_lists() {
        let p = payload(
            r#"[
                { "from": "1", "type": "button", "button": { "text": "Ms. Rivera", "payload": "x" } },
                { "from": "2", "type": "interactive",
                  "interactive": { "type": "button_reply", "button_reply": { "id": "b1", "title": "Yes" } } },
                { "from": "3", "type": "interactive",
                  "interactive": { "type": "list_reply", "list_reply": { "id": "l1", "title": "Room 4" } } }
            ]"#,
        );

        let texts: Vec<String> = p
            .inbound_messages()
            .into_iter()
            .map(|m| m.unwrap().text)
            .collect();
        assert_eq!(texts, vec!["Ms. Rivera", "Yes", "Room 4"]);
    }

    #[test]
    fn image_message_is_unsupported() {
        let p = payload(r#"[{ "from": "15551234567", "type": "image", "image": { "id": "m1" } }]"#);

        assert_eq!(
            p.inbound_messages()[0],
            Err(MalformedPayload::UnsupportedMessageType("image".to_string()))
        );
    }

    #[test]
    fn missing_sender_is_malformed() {
        let p = payload(r#"[{ "type": "text", "text": { "body": "hi" } }]"#);

        assert_eq!(
            p.inbound_messages()[0],
            Err(MalformedPayload::MissingField("from"))
        );
    }

    #[test]
    fn blank_sender_is_malformed() {
        let p = payload(r#"[{ "from": "  ", "type": "text", "text": { "body": "hi" } }]"#);

        assert!(matches!(
            p.inbound_messages()[0],
            Err(MalformedPayload::InvalidSender(_))
        ));
    }

    #[test]
    fn status_callback_has_no_messages() {
        let body = br#"{
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "field": "messages", "value": {
                "statuses": [{ "id": "wamid.X", "status": "delivered" }]
            } }] }]
        }"#;

        let p = WebhookPayload::parse(body).unwrap();
        assert_eq!(p.messages().count(), 0);
        assert_eq!(p.status_count(), 1);
    }

    #[test]
    fn handles_every_message_of_a_batch() {
        let body = br#"{
            "entry": [
                { "changes": [{ "value": { "messages": [
                    { "from": "1", "type": "text", "text": { "body": "a" } },
                    { "from": "2", "type": "text", "text": { "body": "b" } }
                ] } }] },
                { "changes": [{ "value": { "messages": [
                    { "from": "3", "type": "text", "text": { "body": "c" } }
                ] } }] }
            ]
        }"#;

        let p = WebhookPayload::parse(body).unwrap();
        assert_eq!(p.inbound_messages().len(), 3);
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            WebhookPayload::parse(b"not json"),
            Err(MalformedPayload::InvalidJson(_))
        ));
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_now() {
        let p = payload(
            r#"[{ "from": "1", "timestamp": "soon", "type": "text", "text": { "body": "a" } }]"#,
        );
        let before = Timestamp::now();
        let msg = p.inbound_messages().remove(0).unwrap();
        assert!(!before.is_after(&msg.received_at));
    }
}

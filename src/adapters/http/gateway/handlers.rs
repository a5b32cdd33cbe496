//! HTTP handlers of the webhook gateway.
//!
//! The gateway only parses and acknowledges. Every inbound text message is
//! handed to the orchestrator on its own task, so the platform gets its `200`
//! before any spreadsheet or messaging call is made.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::adapters::whatsapp::WebhookPayload;
use crate::application::{
    ConversationOrchestrator, SendTemplateCommand, SendTemplateError, SendTemplateHandler,
};
use crate::domain::webhook::{InboundMessage, VerificationRequest, WebhookVerifier};

use super::dto::{ErrorResponse, HealthResponse, TriggerRequest, TriggerResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state of the gateway routes.
#[derive(Clone)]
pub struct GatewayState {
    pub verifier: Arc<WebhookVerifier>,
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub templates: Arc<SendTemplateHandler>,
    pub privacy_policy_path: Option<PathBuf>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// GET /webhook - Subscription handshake
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(request): Query<VerificationRequest>,
) -> Response {
    match state.verifier.verify(&request) {
        Ok(challenge) => {
            tracing::info!("Webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        Err(e) => {
            tracing::warn!(reason = %e, "Webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhook - Inbound notifications
///
/// Always answers 200; malformed entries are logged and dropped.
pub async fn receive_webhook(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    let payload = match WebhookPayload::parse(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, bytes = body.len(), "Ignoring unparseable webhook body");
            return StatusCode::OK;
        }
    };

    let statuses = payload.status_count();
    if statuses > 0 {
        tracing::debug!(statuses, "Ignoring delivery status callbacks");
    }

    let messages = payload
        .inbound_messages()
        .into_iter()
        .filter_map(|result| match result {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring webhook message");
                None
            }
        });

    // One task per sender; a sender's messages run in payload order
    for batch in group_by_sender(messages) {
        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            for message in batch {
                let outcome = orchestrator.handle_inbound(message).await;
                tracing::debug!(?outcome, "Inbound message handled");
            }
        });
    }

    StatusCode::OK
}

/// Groups messages by sender, keeping first-seen sender order and the
/// original order within each sender.
fn group_by_sender(
    messages: impl IntoIterator<Item = InboundMessage>,
) -> Vec<Vec<InboundMessage>> {
    let mut batches: Vec<Vec<InboundMessage>> = Vec::new();
    for message in messages {
        match batches
            .iter_mut()
            .find(|batch| batch[0].sender_id == message.sender_id)
        {
            Some(batch) => batch.push(message),
            None => batches.push(vec![message]),
        }
    }
    batches
}

// ════════════════════════════════════════════════════════════════════════════════
// Trigger
// ════════════════════════════════════════════════════════════════════════════════

/// POST /trigger - Send an approved template
///
/// Authenticated with `Authorization: Bearer <verify token>`.
pub async fn trigger_template(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(GatewayError::Unauthorized)?;
    if !state.verifier.token_matches(token.trim()) {
        return Err(GatewayError::Unauthorized);
    }

    let request: TriggerRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::BadRequest(format!("invalid request body: {}", e)))?;

    let cmd = SendTemplateCommand {
        to: request.to,
        template: request.template,
        language: request.language,
        parameters: request.parameters,
    };
    let sent = state.templates.handle(cmd).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            message_id: sent.message_id,
        }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// Static
// ════════════════════════════════════════════════════════════════════════════════

/// GET /privacy - Privacy policy page
pub async fn privacy_policy(State(state): State<GatewayState>) -> Result<Html<String>, GatewayError> {
    let path = state.privacy_policy_path.as_ref().ok_or(GatewayError::NotFound)?;
    match tokio::fs::read_to_string(path).await {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot read privacy policy");
            Err(GatewayError::NotFound)
        }
    }
}

/// GET /health - Liveness
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Error returned by gateway handlers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("messaging platform rejected the request: {0}")]
    Upstream(String),
}

impl From<SendTemplateError> for GatewayError {
    fn from(err: SendTemplateError) -> Self {
        match err {
            SendTemplateError::Validation(e) => GatewayError::BadRequest(e.to_string()),
            SendTemplateError::Delivery(e) => GatewayError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            GatewayError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            GatewayError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            GatewayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED"),
        };
        if matches!(self, GatewayError::Upstream(_)) {
            tracing::error!(error = %self, "Trigger failed");
        }
        let body = ErrorResponse::new(error_code, self.to_string());
        (status, Json(body)).into_response()
    }
}

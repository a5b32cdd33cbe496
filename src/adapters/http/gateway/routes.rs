//! Axum router configuration for the webhook gateway.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    health, privacy_policy, receive_webhook, trigger_template, verify_webhook, GatewayState,
};

/// Create the gateway routes.
///
/// # Routes
/// - `GET /webhook` - Subscription handshake
/// - `POST /webhook` - Inbound notifications
/// - `POST /trigger` - Send an approved template (bearer auth)
/// - `GET /privacy` - Privacy policy page
/// - `GET /health` - Liveness
pub fn gateway_routes() -> Router<GatewayState> {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/trigger", post(trigger_template))
        .route("/privacy", get(privacy_policy))
        .route("/health", get(health))
}

/// Gateway routes with state, request tracing and a request timeout applied.
pub fn gateway_router(state: GatewayState, request_timeout: Duration) -> Router {
    gateway_routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::converter::MockFormatConverter;
    use crate::adapters::sheets::MockSpreadsheetService;
    use crate::adapters::storage::{InMemorySessionStore, LocalArtifactStore};
    use crate::adapters::whatsapp::{MockMessagingPlatform, SentRecord};
    use crate::application::{
        ConversationOrchestrator, ConversationSettings, ConversationTexts, DocumentPipeline,
        OutboundMessenger, PipelineSettings, SendTemplateHandler,
    };
    use crate::domain::conversation::StartCommand;
    use crate::domain::document::{CellLocation, DocumentFormat, ExportRegion, PageLayout};
    use crate::domain::webhook::WebhookVerifier;
    use crate::ports::MessagingError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::Secret;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    // ───────────────────────────────────────────────────────────────
    // Fixture
    // ───────────────────────────────────────────────────────────────

    const TOKEN: &str = "my_secret_token";

    fn app(platform: &MockMessagingPlatform, temp: &TempDir, privacy: Option<PathBuf>) -> Router {
        let timeout = Duration::from_secs(5);
        let messenger = OutboundMessenger::new(Arc::new(platform.clone()), timeout);
        let pipeline = DocumentPipeline::new(
            Arc::new(MockSpreadsheetService::new()),
            Arc::new(MockFormatConverter::new()),
            PipelineSettings {
                input_cell: CellLocation::new("Sheet1!B2").unwrap(),
                region: ExportRegion::default(),
                layout: PageLayout::default(),
                delivery_format: DocumentFormat::Png,
                step_timeout: timeout,
            },
        );
        let orchestrator = ConversationOrchestrator::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(LocalArtifactStore::new(temp.path())),
            pipeline,
            messenger.clone(),
            ConversationSettings {
                start_command: StartCommand::new("/timetable").unwrap(),
                input_field: "teacher_name".to_string(),
                texts: ConversationTexts::default(),
            },
        );
        let state = GatewayState {
            verifier: Arc::new(WebhookVerifier::new(Secret::new(TOKEN.to_string()))),
            orchestrator: Arc::new(orchestrator),
            templates: Arc::new(SendTemplateHandler::new(messenger)),
            privacy_policy_path: privacy,
        };
        gateway_router(state, timeout)
    }

    fn text_webhook(from: &str, body: &str) -> String {
        format!(
            r#"{{"object":"whatsapp_business_account","entry":[{{"id":"1","changes":[{{"field":"messages",
               "value":{{"messages":[{{"from":"{}","id":"wamid.1","type":"text","text":{{"body":"{}"}}}}]}}}}]}}]}}"#,
            from, body
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: String, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn wait_for_sent(platform: &MockMessagingPlatform, count: usize) {
        for _ in 0..200 {
            if platform.sent_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} sent messages, got {}", count, platform.sent_count());
    }

    // ───────────────────────────────────────────────────────────────
    // Verification
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn verification_echoes_challenge() {
        let temp = TempDir::new().unwrap();
        let app = app(&MockMessagingPlatform::new(), &temp, None);

        let (status, body) = send(
            app,
            get("/webhook?hub.mode=subscribe&hub.verify_token=my_secret_token&hub.challenge=1158201444"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1158201444");
    }

    #[tokio::test]
    async fn verification_rejects_wrong_token_with_empty_body() {
        let temp = TempDir::new().unwrap();
        let app = app(&MockMessagingPlatform::new(), &temp, None);

        let (status, body) = send(
            app,
            get("/webhook?hub.mode=subscribe&hub.verify_token=guess&hub.challenge=1"),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn verification_rejects_missing_parameters() {
        let temp = TempDir::new().unwrap();
        let app = app(&MockMessagingPlatform::new(), &temp, None);

        let (status, _) = send(app, get("/webhook")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // ───────────────────────────────────────────────────────────────
    // Inbound
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn inbound_text_is_acknowledged_and_handled() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();
        let app = app(&platform, &temp, None);

        let (status, _) = send(
            app,
            post("/webhook", text_webhook("15551234567", "/timetable"), None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        wait_for_sent(&platform, 1).await;
        let sender = crate::domain::foundation::SenderId::new("15551234567").unwrap();
        assert_eq!(
            platform.texts_to(&sender),
            vec![ConversationTexts::default().prompt]
        );
    }

    fn batch_webhook(from: &str, bodies: &[&str]) -> String {
        let messages: Vec<serde_json::Value> = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                serde_json::json!({
                    "from": from,
                    "id": format!("wamid.{}", i),
                    "type": "text",
                    "text": { "body": body }
                })
            })
            .collect();
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{ "field": "messages", "value": { "messages": messages } }]
            }]
        })
        .to_string()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_sender_batch_is_handled_in_order() {
        let sender = crate::domain::foundation::SenderId::new("15551234567").unwrap();

        for _ in 0..25 {
            let temp = TempDir::new().unwrap();
            let platform = MockMessagingPlatform::new();
            let app = app(&platform, &temp, None);

            let (status, _) = send(
                app,
                post(
                    "/webhook",
                    batch_webhook("15551234567", &["/timetable", "Ms. Rivera"]),
                    None,
                ),
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            wait_for_sent(&platform, 2).await;
            assert_eq!(
                platform.texts_to(&sender),
                vec![ConversationTexts::default().prompt]
            );
            assert_eq!(platform.media_to(&sender).len(), 1);
        }
    }

    #[tokio::test]
    async fn garbage_body_is_still_acknowledged() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();
        let app = app(&platform, &temp, None);

        let (status, _) = send(app, post("/webhook", "not json".to_string(), None)).await;

        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(platform.sent_count(), 0);
    }

    #[tokio::test]
    async fn status_callbacks_are_acknowledged_without_replies() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();
        let app = app(&platform, &temp, None);
        let body = r#"{"object":"whatsapp_business_account","entry":[{"id":"1","changes":[{"field":"messages",
            "value":{"statuses":[{"id":"wamid.1","status":"delivered"}]}}]}]}"#;

        let (status, _) = send(app, post("/webhook", body.to_string(), None)).await;

        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(platform.sent_count(), 0);
    }

    // ───────────────────────────────────────────────────────────────
    // Trigger
    // ───────────────────────────────────────────────────────────────

    fn trigger_body() -> String {
        r#"{"to":"15551234567","template":"timetable_ready","parameters":["Monday"]}"#.to_string()
    }

    #[tokio::test]
    async fn trigger_requires_bearer_token() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();

        let (missing, _) = send(
            app(&platform, &temp, None),
            post("/trigger", trigger_body(), None),
        )
        .await;
        let (wrong, _) = send(
            app(&platform, &temp, None),
            post("/trigger", trigger_body(), Some("guess")),
        )
        .await;

        assert_eq!(missing, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, StatusCode::UNAUTHORIZED);
        assert_eq!(platform.sent_count(), 0);
    }

    #[tokio::test]
    async fn trigger_sends_template() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();

        let (status, body) = send(
            app(&platform, &temp, None),
            post("/trigger", trigger_body(), Some(TOKEN)),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.contains("wamid-"));
        assert!(matches!(platform.sent()[0], SentRecord::Template { .. }));
    }

    #[tokio::test]
    async fn trigger_rejects_invalid_body() {
        let temp = TempDir::new().unwrap();
        let platform = MockMessagingPlatform::new();

        let (status, body) = send(
            app(&platform, &temp, None),
            post("/trigger", r#"{"to":"15551234567","template":" "}"#.to_string(), Some(TOKEN)),
        )
        .await;
        let (malformed, _) = send(
            app(&platform, &temp, None),
            post("/trigger", "{".to_string(), Some(TOKEN)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("VALIDATION_FAILED"));
        assert_eq!(malformed, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trigger_reports_platform_failure_as_bad_gateway() {
        let temp = TempDir::new().unwrap();
        let platform =
            MockMessagingPlatform::new().with_send_error(MessagingError::api(400, "bad template"));

        let (status, _) = send(
            app(&platform, &temp, None),
            post("/trigger", trigger_body(), Some(TOKEN)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    // ───────────────────────────────────────────────────────────────
    // Static
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn privacy_serves_configured_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("privacy.html");
        std::fs::write(&path, "<h1>Privacy</h1>").unwrap();
        let artifacts = TempDir::new().unwrap();

        let (status, body) = send(
            app(&MockMessagingPlatform::new(), &artifacts, Some(path)),
            get("/privacy"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Privacy</h1>");
    }

    #[tokio::test]
    async fn privacy_is_not_found_without_file() {
        let temp = TempDir::new().unwrap();

        let (unset, _) = send(app(&MockMessagingPlatform::new(), &temp, None), get("/privacy")).await;
        let (missing, _) = send(
            app(
                &MockMessagingPlatform::new(),
                &temp,
                Some(temp.path().join("absent.html")),
            ),
            get("/privacy"),
        )
        .await;

        assert_eq!(unset, StatusCode::NOT_FOUND);
        assert_eq!(missing, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let temp = TempDir::new().unwrap();

        let (status, body) = send(app(&MockMessagingPlatform::new(), &temp, None), get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }
}

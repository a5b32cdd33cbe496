//! Sheet Courier server entry point.
//!
//! Loads configuration, wires the adapters into the orchestrator and serves the
//! webhook gateway until Ctrl-C.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use sheet_courier::adapters::converter::PopplerConverter;
use sheet_courier::adapters::http::{gateway_router, GatewayState};
use sheet_courier::adapters::sheets::{
    AccessTokenSource, GoogleSheetsService, ServiceAccountKey, ServiceAccountTokenSource,
    StaticTokenSource,
};
use sheet_courier::adapters::storage::{InMemorySessionStore, LocalArtifactStore, SessionSweeper};
use sheet_courier::adapters::whatsapp::WhatsAppCloudClient;
use sheet_courier::application::{
    ConversationOrchestrator, DocumentPipeline, OutboundMessenger, SendTemplateHandler,
};
use sheet_courier::config::{AppConfig, ConfigError, LogFormat, ServerConfig, SheetsConfig};
use sheet_courier::domain::webhook::WebhookVerifier;
use sheet_courier::ports::SessionStore;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.server);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server stopped with error");
        std::process::exit(1);
    }
}

fn load_config() -> Result<AppConfig, ConfigError> {
    let config = AppConfig::load()?;
    config.validate()?;
    Ok(config)
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    match server.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn token_source(sheets: &SheetsConfig) -> Result<Arc<dyn AccessTokenSource>, BoxError> {
    if let Some(path) = &sheets.credentials_path {
        let key = ServiceAccountKey::from_file(path).await?;
        tracing::info!(client_email = %key.client_email, "Using service account credentials");
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(sheets.timeout_secs))
            .build()?;
        return Ok(Arc::new(ServiceAccountTokenSource::new(
            key,
            sheets.token_url.clone(),
            http,
        )));
    }
    match &sheets.access_token {
        Some(token) => {
            tracing::info!("Using static spreadsheet access token");
            Ok(Arc::new(StaticTokenSource::new(
                token.expose_secret().clone(),
            )))
        }
        None => Err("no spreadsheet credentials configured".into()),
    }
}

async fn run(config: AppConfig) -> Result<(), BoxError> {
    tracing::info!(
        environment = ?config.server.environment,
        delivery_format = %config.pipeline.delivery_format,
        "Starting Sheet Courier"
    );

    // Outbound adapters
    let tokens = token_source(&config.sheets).await?;
    let spreadsheet = GoogleSheetsService::new(config.sheets.client_config(), tokens)?;

    let mut converter = PopplerConverter::new()
        .with_dpi(config.pipeline.render_dpi)
        .with_timeout(config.pipeline.step_timeout_secs);
    if let Some(path) = &config.pipeline.pdftoppm_path {
        converter = converter.with_pdftoppm_path(path.clone());
    }

    let platform = WhatsAppCloudClient::new(config.whatsapp.client_config())?;

    // Storage
    let sessions = Arc::new(InMemorySessionStore::with_ttl(config.conversation.session_ttl()));
    tokio::fs::create_dir_all(&config.pipeline.artifact_dir).await?;
    let artifacts = LocalArtifactStore::new(&config.pipeline.artifact_dir)
        .with_basename(config.pipeline.artifact_basename.clone());

    // Application
    let step_timeout = config.pipeline.step_timeout();
    let messenger = OutboundMessenger::new(Arc::new(platform), step_timeout);
    let pipeline = DocumentPipeline::new(
        Arc::new(spreadsheet),
        Arc::new(converter),
        config.pipeline_settings()?,
    );
    let orchestrator = ConversationOrchestrator::new(
        sessions.clone(),
        Arc::new(artifacts),
        pipeline,
        messenger.clone(),
        config.conversation.settings()?,
    );

    let state = GatewayState {
        verifier: Arc::new(WebhookVerifier::new(config.whatsapp.verify_token.clone())),
        orchestrator: Arc::new(orchestrator),
        templates: Arc::new(SendTemplateHandler::new(messenger)),
        privacy_policy_path: config.server.privacy_policy_path.clone(),
    };

    // Background session sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let store: Arc<dyn SessionStore> = sessions;
    let sweeper = SessionSweeper::new(store, config.conversation.sweep_interval());
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let app = gateway_router(state, config.server.request_timeout());
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_task.await {
        tracing::warn!(error = %e, "Session sweeper task failed");
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl-C");
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

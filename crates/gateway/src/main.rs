//! Kochi API Gateway
//!
//! The entry point for external API requests. Handles:
//! - Request validation and persona resolution
//! - Routing into the answer pipeline
//! - Observability (logging, metrics, request ids)

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use kochi_answer::AnswerOrchestrator;
use kochi_common::{
    config::AppConfig,
    corpus::{CorpusStore, InMemoryCorpus},
    llm::HttpLlmClient,
    metrics,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<AnswerOrchestrator>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting Kochi API Gateway v{}", kochi_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            Ok(()) => info!("Prometheus exporter listening on {}", metrics_addr),
            Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
        }
    }

    // Corpus access: snapshot-backed in-memory store, or empty until the
    // ingestion collaborator wires a real backend
    let corpus: Arc<dyn CorpusStore> = match &config.corpus.snapshot_path {
        Some(path) => {
            info!("Loading corpus snapshot from {}", path);
            let store = InMemoryCorpus::from_json_file(path)?;
            info!("Corpus snapshot loaded: {} chunks", store.len());
            Arc::new(store)
        }
        None => {
            warn!("No corpus snapshot configured, starting with an empty corpus");
            Arc::new(InMemoryCorpus::default())
        }
    };

    // Language model client
    if config.llm.api_key.is_empty() {
        warn!("LLM API key not set, using deterministic mock replies");
    }
    let llm = Arc::new(HttpLlmClient::new(config.llm.clone())?);

    let orchestrator = Arc::new(AnswerOrchestrator::new(corpus, llm, &config));

    // Create app state
    let state = AppState {
        config: config.clone(),
        orchestrator,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Companion endpoints
        .route("/companion/query", post(handlers::companion::query))
        .route("/companion/compare", post(handlers::companion::compare));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

//! IoT RAG API Gateway
//!
//! The HTTP entry point for the IoT question-answering service.
//! Handles:
//! - Startup wiring of the semantic index and the concept graph
//! - Request routing and validation
//! - Rate limiting, timeouts and concurrency limits
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use iotrag_common::{
    config::{AppConfig, ObservabilityConfig},
    metrics, GraphService, RagService,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::{BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Multipart framing on top of the file itself
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub rag: Arc<RagService>,
    pub graph: Arc<GraphService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            rag: Arc::new(RagService::new(&config)),
            graph: Arc::new(GraphService::new(&config.graph)),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config.observability);

    info!("Starting IoT RAG API Gateway v{}", iotrag_common::VERSION);

    // Initialize metrics
    if let Err(e) = metrics::install_exporter(config.observability.metrics_port) {
        warn!(error = %e, "Failed to install metrics exporter");
    }
    metrics::register_metrics();

    let state = AppState::new(config);
    startup(&state).await;

    // Build the router
    let app = create_router(state.clone());

    // Start the server
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.rag.shutdown().await;
    state.graph.close().await;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Bring up both subsystems. Failures are logged and the server starts
/// anyway; readiness reports what is missing.
async fn startup(state: &AppState) {
    match state.graph.connect().await {
        Ok(()) if state.config.graph.seed_on_startup => {
            match state.graph.initialize_sample_graph().await {
                Ok(report) if !report.is_complete() => {
                    warn!(failures = report.failures, "Sample graph partially seeded")
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to seed sample graph"),
            }
        }
        Ok(()) => {}
        Err(e) => warn!(error = %e, "Graph unavailable, continuing without it"),
    }

    if let Err(e) = state.rag.initialize().await {
        warn!(error = %e, "Semantic clients unavailable, queries will be rejected");
        return;
    }

    match state.rag.load_documents(state.rag.docs_dir()).await {
        Ok(outcome) => info!(?outcome, "Initial indexing finished"),
        Err(e) => warn!(error = %e, "Initial indexing failed"),
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

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
        .route("/health", get(handlers::health::ready))
        .route("/query", post(handlers::query::query))
        .route("/documents/reload", post(handlers::documents::reload))
        .route("/upload", post(handlers::documents::upload))
        .route("/graph/related", post(handlers::graph::related_concepts));

    let mut app = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::request_metrics::track_metrics))
        .layer(DefaultBodyLimit::max(
            config.server.max_upload_bytes + UPLOAD_OVERHEAD_BYTES,
        ));

    if config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(&config.rate_limit);
        app = app.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    // Compose the app
    app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(config.request_timeout())
            .concurrency_limit(config.server.max_concurrent_requests.max(1)),
    )
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .layer(request_id)
    .layer(propagate_id)
    .with_state(state)
}

async fn handle_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({"error": {"code": "REQUEST_TIMEOUT", "message": "Request timed out"}})),
        )
    } else {
        error!(error = %err, "Unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"code": "INTERNAL_ERROR", "message": err.to_string()}})),
        )
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

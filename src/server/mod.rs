use crate::catalog::{Catalog, Entitlements, MemoryCatalog};
use crate::config::Config;
use crate::streaming::{self, start_sweep_task, ProgressTracker, TokenAuthority};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod guard;
pub mod routes_playback;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Asset lookup, delegated to the surrounding application.
    pub catalog: Arc<dyn Catalog>,
    /// Authentication and entitlement checks, delegated likewise.
    pub entitlements: Arc<dyn Entitlements>,
    /// Stream token mint/validate/sweep state.
    pub tokens: Arc<TokenAuthority>,
    /// Per-user playback positions.
    pub progress: Arc<ProgressTracker>,
}

impl AppContext {
    /// Build a context from config with the in-memory collaborator.
    pub fn from_config(config: Config) -> Self {
        let catalog = Arc::new(MemoryCatalog::from_config(&config));
        let tokens = Arc::new(TokenAuthority::new(chrono::Duration::hours(
            config.streaming.token_ttl_hours as i64,
        )));
        let progress = Arc::new(ProgressTracker::new(
            config.streaming.completion_threshold,
        ));
        Self {
            config: Arc::new(config),
            catalog: catalog.clone(),
            entitlements: catalog,
            tokens,
            progress,
        }
    }

    /// External base URL embedded into manifests and stream URLs.
    pub fn base_url(&self) -> String {
        match &self.config.server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "http://{}:{}",
                self.config.server.host, self.config.server.port
            ),
        }
    }
}

/// Request-boundary error wrapper mapping the gateway taxonomy onto HTTP.
#[derive(Debug)]
pub struct ApiError(pub streamgate_common::Error);

impl From<streamgate_common::Error> for ApiError {
    fn from(err: streamgate_common::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use streamgate_common::Error;

        match self.0 {
            // One generic surface for every rejection reason, so clients
            // cannot probe the difference between unknown and expired.
            Error::Unauthorized => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "forbidden"})),
            )
                .into_response(),
            Error::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": msg})),
            )
                .into_response(),
            // Report the true size so the client can retry correctly.
            Error::InvalidRange { size } => Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{size}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"error": "invalid range", "size": size}).to_string(),
                ))
                .unwrap_or_else(|_| StatusCode::RANGE_NOT_SATISFIABLE.into_response()),
            Error::UpstreamUnavailable(detail) => {
                tracing::warn!(detail, "Backing resource unavailable");
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({"error": "media not available"})),
                )
                    .into_response()
            }
            Error::Io(e) => {
                tracing::error!(error = %e, "I/O failure in request handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "internal error"})),
                )
                    .into_response()
            }
            Error::Internal(detail) => {
                tracing::error!(detail, "Internal failure in request handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "internal error"})),
                )
                    .into_response()
            }
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Token issuance, progress, continue-watching, diagnostics
        .merge(routes_playback::playback_routes())
        // Token-guarded manifest/segment/byte-range delivery
        .nest("/stream", streaming::stream_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let sweep_interval = config.streaming.sweep_interval_secs;
    let ctx = AppContext::from_config(config);

    // Background expiry sweep keeps the token store from accumulating
    // entries that validation never touches again.
    start_sweep_task(ctx.tokens.clone(), sweep_interval);

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

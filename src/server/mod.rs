//! HTTP surface: `POST /api/chat` and a liveness probe.

mod errors;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::chat::{ChatHistory, Message};
use crate::config::ServerConfig;
use crate::pipeline::RagPipeline;

pub use errors::{ApiError, ErrorBody, GENERIC_ERROR_MESSAGE};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

/// Successful `/api/chat` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Routes without middleware
#[inline]
pub fn router(pipeline: Arc<RagPipeline>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .with_state(AppState { pipeline })
}

/// Routes with request tracing, plus CORS when origins are configured
#[inline]
pub fn build_app(config: &ServerConfig, pipeline: Arc<RagPipeline>) -> Result<Router> {
    let mut app = router(pipeline).layer(TraceLayer::new_for_http());

    if !config.allowed_origins.is_empty() {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim_end_matches('/'))
                    .with_context(|| format!("Invalid CORS origin: {origin}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(std::time::Duration::from_secs(3600));
        app = app.layer(cors);
    }

    Ok(app)
}

/// Bind and serve until Ctrl-C
#[inline]
pub async fn serve(config: &ServerConfig, pipeline: RagPipeline) -> Result<()> {
    let app = build_app(config, Arc::new(pipeline))?;

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Message>>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        let Json(messages) =
            payload.map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))?;
        let history = ChatHistory::new(messages)?;

        let response = state.pipeline.respond(&history).await?;
        info!("Answered chat request ({} chars)", response.len());
        Ok::<_, ApiError>(Json(ChatResponse { response }))
    }
    .instrument(span)
    .await
}

//! Render service: accepts an HTML fragment over HTTP and answers with the
//! rendered PDF, rate limited per client address.

pub mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::engine::{ForgeEngine, RenderEngine};
use crate::normalize::{normalize_with, ShellOptions};
use crate::pipeline::PipelineConfig;
use crate::request::{local_filename, ExportPayload};

pub use rate_limit::{Decision, FixedWindowLimiter};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn RenderEngine>,
    limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    pub fn new(engine: Arc<dyn RenderEngine>, config: &ServerConfig) -> Self {
        Self {
            engine,
            limiter: Arc::new(FixedWindowLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/export", post(export_pdf))
        .route("/api/export", post(export_pdf))
        .with_state(state)
}

/// Bind `config.bind` and serve until the process exits.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.bind).await?;
    let state = AppState::new(Arc::new(ForgeEngine), &config);
    serve_on(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    log::info!("render service listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

async fn export_pdf(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(payload): Json<ExportPayload>,
) -> Response {
    if let Decision::Limited { retry_after } = state.limiter.check(peer.ip(), Instant::now()) {
        log::warn!("rate limit exceeded for {}", peer.ip());
        let mut response = detail(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please wait a minute before exporting again.",
        );
        response.headers_mut().insert(
            header::RETRY_AFTER,
            header::HeaderValue::from(retry_after.as_secs()),
        );
        return response;
    }

    if payload.html_content.trim().is_empty() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "html_content must not be empty");
    }

    let orientation = payload.orientation;
    log::info!(
        "rendering {} bytes of HTML for {} ({orientation})",
        payload.html_content.len(),
        peer.ip()
    );

    let engine = state.engine.clone();
    let rendered = tokio::task::spawn_blocking(move || {
        let document = normalize_with(&payload.html_content, &ShellOptions::for_orientation(orientation));
        engine.render(&document, &PipelineConfig::a4(orientation))
    })
    .await;

    match rendered {
        Ok(Ok(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", local_filename()),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(Err(e)) => {
            log::error!("render failed: {e}");
            detail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            log::error!("render task failed: {e}");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "renderer crashed")
        }
    }
}

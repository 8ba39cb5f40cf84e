//! End-to-end export flows: the controller, both exporters, the render
//! service over real sockets, downloads and the clipboard.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;

use guia_export::clipboard::{CopyStatus, CopyTracker, MemoryClipboard, COPY_ACK};
use guia_export::config::{ExportConfig, ServerConfig};
use guia_export::content::FileContent;
use guia_export::download::{DirectorySink, MemorySink};
use guia_export::engine::ForgeEngine;
use guia_export::local::LocalExporter;
use guia_export::remote::RemoteExporter;
use guia_export::server::{self, AppState};
use guia_export::{
    ExportController, ExportError, ExportRequest, ExportService, ExportState, ExportStrategy, Exporter,
    FailureKind, Orientation,
};

use common::samples;

// =====================================================================
// Helpers
// =====================================================================

/// Start the render service on an ephemeral port.
async fn spawn_service(rate_limit_max: u32) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        bind: addr,
        rate_limit_max,
        rate_limit_window: Duration::from_secs(60),
    };
    let state = AppState::new(Arc::new(ForgeEngine), &config);
    tokio::spawn(async move {
        let _ = server::serve_on(listener, state).await;
    });
    addr
}

/// Serve an arbitrary router on an ephemeral port.
async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

fn remote_to(addr: SocketAddr) -> RemoteExporter {
    RemoteExporter::new(&ExportConfig {
        api_base: format!("http://{addr}"),
        ..ExportConfig::default()
    })
    .unwrap()
}

fn service_for(addr: SocketAddr) -> ExportService {
    ExportService::new(LocalExporter::forge(), remote_to(addr))
}

// =====================================================================
// Local strategy
// =====================================================================

#[tokio::test]
async fn local_export_without_renderer_downloads_nothing() {
    let service = ExportService::new(LocalExporter::unavailable(), remote_to(([127, 0, 0, 1], 9).into()));
    let controller = ExportController::new(service, MemorySink::new());

    let err = controller.run(ExportRequest::local(samples::hero())).await.unwrap_err();

    assert!(matches!(err, ExportError::RendererUnavailable));
    assert_eq!(controller.state(), ExportState::Failed(FailureKind::RendererUnavailable));
    assert_eq!(controller.sink().count(), 0);
}

#[tokio::test]
async fn local_export_ignores_landscape() {
    let artifact = LocalExporter::forge()
        .export(&ExportRequest::new(samples::hero(), Orientation::Landscape, ExportStrategy::Local))
        .await
        .unwrap();
    assert_eq!(artifact.filename, "guia-comunidadfeliz.pdf");
    assert_eq!(artifact.orientation, Orientation::Portrait);
    assert_eq!(&artifact.bytes[0..5], b"%PDF-");
}

#[tokio::test]
async fn local_export_saves_into_the_download_directory() {
    let dir = tempfile::tempdir().unwrap();
    let service = ExportService::new(LocalExporter::forge(), remote_to(([127, 0, 0, 1], 9).into()));
    let controller = ExportController::new(service, DirectorySink::new(dir.path()));

    let delivered = controller.run(ExportRequest::local(samples::full_guide())).await.unwrap();

    let path = delivered.path.expect("written to disk");
    assert_eq!(path, dir.path().join("guia-comunidadfeliz.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
    assert_eq!(bytes.len(), delivered.len);
    // No temporary files left behind.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    assert_eq!(controller.state(), ExportState::Succeeded);
}

#[tokio::test]
async fn generated_content_is_cleaned_and_exported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("guia.md");
    std::fs::write(&input, format!("```html\n{}\n```\n", samples::timeline())).unwrap();

    let service = ExportService::new(LocalExporter::forge(), remote_to(([127, 0, 0, 1], 9).into()));
    let controller = ExportController::new(service, MemorySink::new());
    let delivered = controller
        .generate_and_export(&FileContent::new(&input), "", Orientation::Portrait, ExportStrategy::Local)
        .await
        .unwrap();

    assert_eq!(delivered.filename, "guia-comunidadfeliz.pdf");
    assert_eq!(controller.sink().count(), 1);
}

#[tokio::test]
async fn missing_content_file_is_a_generation_failure() {
    let service = ExportService::new(LocalExporter::forge(), remote_to(([127, 0, 0, 1], 9).into()));
    let controller = ExportController::new(service, MemorySink::new());
    let err = controller
        .generate_and_export(
            &FileContent::new("/nonexistent/guia.html"),
            "",
            Orientation::Portrait,
            ExportStrategy::Local,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::ContentGeneration(_)));
    assert_eq!(controller.state(), ExportState::Failed(FailureKind::ContentGeneration));
    assert_eq!(controller.sink().count(), 0);
}

#[tokio::test]
async fn deeply_nested_fragment_exports_locally() {
    let artifact = LocalExporter::forge()
        .export(&ExportRequest::local(samples::nested_divs(1500, "<p>hondo</p>")))
        .await
        .unwrap();
    assert_eq!(&artifact.bytes[0..5], b"%PDF-");
}

// =====================================================================
// Remote strategy against the render service
// =====================================================================

#[tokio::test]
async fn remote_portrait_export_downloads_once() {
    let addr = spawn_service(5).await;
    let controller = ExportController::new(service_for(addr), MemorySink::new());

    let delivered = controller
        .run(ExportRequest::remote("<p>Hola</p>", Orientation::Portrait))
        .await
        .unwrap();

    assert_eq!(delivered.filename, "guia-comunidadfeliz-portrait.pdf");
    assert_eq!(controller.sink().filenames(), vec!["guia-comunidadfeliz-portrait.pdf"]);
    assert_eq!(&controller.sink().last_bytes().unwrap()[0..5], b"%PDF-");
    assert_eq!(controller.state(), ExportState::Succeeded);
}

#[tokio::test]
async fn remote_landscape_export_is_named_for_its_orientation() {
    let addr = spawn_service(5).await;
    let artifact = remote_to(addr)
        .export(&ExportRequest::remote(samples::card_grid(), Orientation::Landscape))
        .await
        .unwrap();
    assert_eq!(artifact.filename, "guia-comunidadfeliz-landscape.pdf");
    assert_eq!(artifact.strategy, ExportStrategy::Remote);
    assert_eq!(&artifact.bytes[0..5], b"%PDF-");
}

#[tokio::test]
async fn second_request_in_window_is_rate_limited() {
    let addr = spawn_service(1).await;
    let controller = ExportController::new(service_for(addr), MemorySink::new());

    controller
        .run(ExportRequest::remote("<p>uno</p>", Orientation::Portrait))
        .await
        .unwrap();
    let err = controller
        .run(ExportRequest::remote("<p>dos</p>", Orientation::Portrait))
        .await
        .unwrap_err();

    match err {
        ExportError::RateLimited { retry_after } => {
            assert!(retry_after >= Duration::from_secs(1));
            assert!(retry_after <= Duration::from_secs(60));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert_eq!(controller.state(), ExportState::Failed(FailureKind::RateLimited));
    assert_eq!(controller.sink().count(), 1);
}

#[tokio::test]
async fn blank_remote_fragment_is_rejected() {
    let addr = spawn_service(5).await;
    let controller = ExportController::new(service_for(addr), MemorySink::new());
    let err = controller
        .run(ExportRequest::remote("   ", Orientation::Portrait))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::EmptyFragment));
    assert_eq!(controller.sink().count(), 0);
}

// =====================================================================
// Remote failures
// =====================================================================

#[tokio::test]
async fn server_error_is_an_export_failure() {
    let addr = spawn_stub(Router::new().route(
        "/export",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "browser crashed" })),
            )
        }),
    ))
    .await;
    let controller = ExportController::new(service_for(addr), MemorySink::new());

    let err = controller
        .run(ExportRequest::remote("<p>Hola</p>", Orientation::Portrait))
        .await
        .unwrap_err();

    match &err {
        ExportError::ExportFailure(msg) => assert!(msg.contains("browser crashed"), "{msg}"),
        other => panic!("expected ExportFailure, got {other:?}"),
    }
    assert_eq!(controller.state(), ExportState::Failed(FailureKind::ExportFailure));
    assert_eq!(controller.sink().count(), 0);
}

#[tokio::test]
async fn any_429_is_rate_limited_whatever_the_body() {
    let addr = spawn_stub(Router::new().route(
        "/export",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, b"%PDF-1.7 not really".to_vec()) }),
    ))
    .await;
    let controller = ExportController::new(service_for(addr), MemorySink::new());

    let err = controller
        .run(ExportRequest::remote("<p>Hola</p>", Orientation::Portrait))
        .await
        .unwrap_err();

    // No Retry-After header: the configured cooldown applies.
    match err {
        ExportError::RateLimited { retry_after } => {
            assert_eq!(retry_after, ExportConfig::default().rate_limit_cooldown);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert_eq!(controller.state(), ExportState::Failed(FailureKind::RateLimited));
    assert_eq!(controller.sink().count(), 0);
}

#[tokio::test]
async fn empty_success_body_is_an_export_failure() {
    let addr = spawn_stub(Router::new().route("/export", post(|| async { StatusCode::OK }))).await;
    let err = remote_to(addr)
        .export(&ExportRequest::remote("<p>Hola</p>", Orientation::Portrait))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::ExportFailure(_)));
}

#[tokio::test]
async fn unreachable_service_is_an_export_failure() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let controller = ExportController::new(service_for(addr), MemorySink::new());
    let err = controller
        .run(ExportRequest::remote("<p>Hola</p>", Orientation::Portrait))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::ExportFailure(_)));
    assert_eq!(controller.sink().count(), 0);
}

// =====================================================================
// Render service HTTP surface
// =====================================================================

#[tokio::test]
async fn service_rejects_empty_content() {
    let addr = spawn_service(5).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/export"))
        .json(&json!({ "html_content": "  ", "orientation": "portrait" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn service_answers_on_api_prefix() {
    let addr = spawn_service(5).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/export"))
        .json(&json!({ "html_content": "<p>Hola</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/pdf"
    );
    assert!(response.headers()[reqwest::header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("guia-comunidadfeliz.pdf"));
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[0..5], b"%PDF-");
}

#[tokio::test]
async fn service_survives_deeply_nested_content() {
    let addr = spawn_service(5).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/export");

    let deep = json!({ "html_content": samples::nested_divs(1000, "<p>hondo</p>") });
    let response = client.post(&url).json(&deep).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[0..5], b"%PDF-");

    // Still serving afterwards.
    let next = client
        .post(&url)
        .json(&json!({ "html_content": "<p>Hola</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(next.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn rate_limited_response_carries_retry_after() {
    let addr = spawn_service(1).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/export");
    let body = json!({ "html_content": "<p>Hola</p>" });

    let first = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let second = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    let retry: u64 = second.headers()[reqwest::header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry));
}

// =====================================================================
// Clipboard
// =====================================================================

#[test]
fn copying_twice_leaves_identical_clipboard_contents() {
    let tracker = CopyTracker::new(MemoryClipboard::default());
    let t0 = Instant::now();

    assert!(tracker.copy_fragment_at(samples::hero(), t0));
    let first = Sha256::digest(tracker.clipboard().contents().unwrap().as_bytes());
    assert!(tracker.copy_fragment_at(samples::hero(), t0 + Duration::from_secs(1)));
    let second = Sha256::digest(tracker.clipboard().contents().unwrap().as_bytes());

    assert_eq!(first, second);
    assert_eq!(tracker.status_at(t0 + Duration::from_secs(2)), CopyStatus::Copied);
    assert_eq!(
        tracker.status_at(t0 + Duration::from_secs(1) + COPY_ACK),
        CopyStatus::Idle
    );
}

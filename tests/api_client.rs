//! Client and session against a live local HTTP service.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use video_coach::api::FeedbackCategory;
use video_coach::media::VideoFile;
use video_coach::{AnalysisClient, AnalysisError, AnalysisSession, SessionStatus};

fn scenario_body() -> Value {
    json!({
        "stats": {
            "duration": "0:45",
            "fileSize": "10.0 MB",
            "resolution": "1280x720",
            "fps": 30,
            "uploadDate": "2024-06-01"
        },
        "feedback": [{
            "id": "1",
            "timestamp": 5,
            "time": "0:05",
            "message": "Nice early racket preparation.",
            "type": "positive",
            "category": "Technique"
        }]
    })
}

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn write_video(dir: &Path, name: &str, len: usize) -> VideoFile {
    let path: PathBuf = dir.join(name);
    std::fs::write(&path, vec![7u8; len]).unwrap();
    VideoFile::from_path(&path).unwrap().unwrap()
}

/// Accepts only a multipart upload carrying a `video` part named swing.mp4
async fn strict_analyze(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    // A streamed part of known length still yields a sized request.
    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    let text = String::from_utf8_lossy(&body);

    if content_length != Some(body.len())
        || body.len() < 10 * 1024 * 1024
        || !content_type.starts_with("multipart/form-data")
        || !text.contains("name=\"video\"")
        || !text.contains("filename=\"swing.mp4\"")
        || !text.contains("video/mp4")
    {
        return (StatusCode::BAD_REQUEST, "bad upload").into_response();
    }
    axum::Json(scenario_body()).into_response()
}

#[tokio::test]
async fn successful_analysis_populates_session() {
    let router = Router::new()
        .route("/analyze", post(strict_analyze))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024));
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_video(dir.path(), "swing.mp4", 10 * 1024 * 1024);
    assert_eq!(file.display_size(), "10.0 MB");

    let client = AnalysisClient::new(format!("{}/", base));
    let mut session = AnalysisSession::new();
    session.start_analysis(&client, file).await;

    let stats = session.stats().expect("stats after success");
    assert_eq!(stats.duration, "0:45");
    assert_eq!(stats.file_size, "10.0 MB");
    assert_eq!(stats.resolution, "1280x720");
    assert_eq!(stats.frame_rate, 30);
    assert_eq!(stats.upload_date, "2024-06-01");

    let feedback = session.feedback();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].timestamp_seconds, 5.0);
    assert_eq!(feedback[0].category, FeedbackCategory::Positive);
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn server_error_fails_with_status() {
    let router = Router::new().route(
        "/analyze",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_video(dir.path(), "swing.mp4", 1024);

    let client = AnalysisClient::new(base);
    let result = client
        .submit_for_analysis(&file, CancellationToken::new())
        .await;
    assert_eq!(result.unwrap_err(), AnalysisError::Http { status: 500 });

    let mut session = AnalysisSession::new();
    session.start_analysis(&client, file).await;
    assert!(session.error().unwrap().contains("500"));
    assert_eq!(session.stats(), None);
    assert!(session.feedback().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let router = Router::new().route(
        "/analyze",
        post(|| async { axum::Json(json!({ "stats": null, "items": [] })) }),
    );
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_video(dir.path(), "swing.mp4", 1024);

    let err = AnalysisClient::new(base)
        .submit_for_analysis(&file, CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DECODE_ERROR");
}

#[tokio::test]
async fn unreachable_service_fails_and_retry_reissues() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let file = write_video(dir.path(), "swing.mp4", 1024);

    let client = AnalysisClient::new(format!("http://{}", addr));
    let mut session = AnalysisSession::new();
    session.start_analysis(&client, file.clone()).await;

    let message = session.error().unwrap().to_string();
    assert!(message.starts_with("Failed to reach analysis service"));

    let status = session.retry(&client).await.unwrap();
    assert!(matches!(status, SessionStatus::Failed { .. }));
    assert_eq!(session.last_file(), Some(&file));
}

#[tokio::test]
async fn retry_after_failure_can_succeed() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/analyze",
            post(|State(hits): State<Arc<AtomicUsize>>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
                } else {
                    axum::Json(scenario_body()).into_response()
                }
            }),
        )
        .with_state(Arc::clone(&hits));
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_video(dir.path(), "swing.mp4", 1024);

    let client = AnalysisClient::new(base);
    let mut session = AnalysisSession::new();
    session.start_analysis(&client, file).await;
    assert!(session.error().unwrap().contains("503"));

    session.retry(&client).await.unwrap();
    assert!(session.stats().is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cancellation_aborts_pending_request() {
    let router = Router::new().route(
        "/analyze",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            axum::Json(scenario_body())
        }),
    );
    let base = spawn(router).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_video(dir.path(), "swing.mp4", 1024);

    let client = AnalysisClient::new(base);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.submit_for_analysis(&file, cancel),
    )
    .await
    .expect("cancellation should end the request promptly");
    assert_eq!(result.unwrap_err(), AnalysisError::Cancelled);
}

#[tokio::test]
async fn health_endpoint_reports_status() {
    let healthy = spawn(Router::new().route("/health", get(|| async { "ok" }))).await;
    assert!(AnalysisClient::new(healthy).check_health().await);

    let failing = spawn(Router::new().route(
        "/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;
    assert!(!AnalysisClient::new(failing).check_health().await);
}

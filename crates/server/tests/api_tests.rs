use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{self, Request, StatusCode, header};
use futures::StreamExt;
use tower::ServiceExt;

use ephemera_core::{Clock, ContentLimits, ManualClock, SequentialIdGenerator};
use ephemera_relay::ContentRelay;
use ephemera_server::api::AppState;
use ephemera_server::config::StreamConfig;

const BOUNDARY: &str = "ephemera-test-boundary";

// -- Helpers --------------------------------------------------------------

struct TestApp {
    clock: Arc<ManualClock>,
    relay: Arc<ContentRelay>,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        Self::with(ContentLimits::default(), StreamConfig::default())
    }

    fn with(limits: ContentLimits, stream: StreamConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let relay = Arc::new(
            ContentRelay::builder()
                .clock(Arc::clone(&clock) as Arc<dyn Clock>)
                .id_generator(Arc::new(SequentialIdGenerator::new("t")))
                .limits(limits)
                .build(),
        );
        let state = AppState::new(Arc::clone(&relay), stream);
        Self {
            clock,
            relay,
            state,
        }
    }

    fn router(&self) -> axum::Router {
        ephemera_server::api::router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router().oneshot(request).await.unwrap()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn multipart_upload(field: &str, filename: &str, mime: &str, payload: &[u8]) -> Request<Body> {
    multipart_request(field, filename, Some(mime), payload)
}

fn multipart_request(
    field: &str,
    filename: &str,
    mime: Option<&str>,
    payload: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    if let Some(mime) = mime {
        body.extend_from_slice(format!("Content-Type: {mime}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(http::Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn share_text(app: &TestApp, content: &str, markdown: bool) -> serde_json::Value {
    let response = app
        .send(post_json(
            "/api/text",
            &serde_json::json!({ "content": content, "markdown": markdown }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

/// Read SSE body chunks until `needle` shows up.
async fn read_until(body: &mut axum::body::BodyDataStream, needle: &str) -> String {
    let mut seen = String::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !seen.contains(needle) {
            let chunk = body
                .next()
                .await
                .expect("stream ended early")
                .expect("body error");
            seen.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await
    .expect("timed out waiting for SSE data");
    seen
}

// -- Health & config --------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = TestApp::new();
    let response = app.send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["observers"], 0);
    assert_eq!(json["entries"], 0);
}

#[tokio::test]
async fn config_reports_limits() {
    let app = TestApp::new();
    let json = json_body(app.send(get("/api/config")).await).await;
    assert_eq!(json["ttl_seconds"], 600);
    assert_eq!(json["max_file_size"], 104_857_600);
    assert_eq!(json["max_text_length"], 1000);
    assert!(
        json["allowed_mime_types"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m == "application/pdf")
    );
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = TestApp::new();
    let response = app.send(get("/api-doc/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/api/text"].is_object());
    assert!(json["paths"]["/api/events"].is_object());
}

// -- Text -------------------------------------------------------------------

#[tokio::test]
async fn share_text_returns_201_and_appears_in_listing() {
    let app = TestApp::new();
    let view = share_text(&app, "Check https://example.com now", false).await;
    assert_eq!(view["kind"], "text");
    assert_eq!(view["id"], "t-1");
    assert_eq!(view["raw_content"], "Check https://example.com now");
    assert_eq!(view["link_metadata"]["has_links"], true);
    assert_eq!(view["link_metadata"]["first_url"], "https://example.com");

    let listed = json_body(app.send(get("/api/content")).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], "t-1");
}

#[tokio::test]
async fn markdown_is_rendered() {
    let app = TestApp::new();
    let view = share_text(&app, "# Title\n\n*soft*", true).await;
    assert_eq!(view["is_markdown"], true);
    let rendered = view["rendered_content"].as_str().unwrap();
    assert!(rendered.contains("<h1>Title</h1>"));
    assert!(rendered.contains("<em>soft</em>"));
}

#[tokio::test]
async fn listing_is_newest_first() {
    let app = TestApp::new();
    share_text(&app, "first", false).await;
    app.clock.advance(chrono::Duration::seconds(1));
    share_text(&app, "second", false).await;

    let listed = json_body(app.send(get("/api/content")).await).await;
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["t-2", "t-1"]);
}

#[tokio::test]
async fn blank_text_is_rejected() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            "/api/text",
            &serde_json::json!({ "content": "   " }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn overlong_text_is_rejected() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            "/api/text",
            &serde_json::json!({ "content": "x".repeat(1001) }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.relay.store_len(), 0);
}

// -- Files ------------------------------------------------------------------

#[tokio::test]
async fn upload_then_download() {
    let app = TestApp::new();
    let response = app
        .send(multipart_upload(
            "file",
            "notes.txt",
            "text/plain",
            b"hello from the lan",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let view = json_body(response).await;
    assert_eq!(view["kind"], "file");
    assert_eq!(view["filename"], "notes.txt");
    assert_eq!(view["mime_type"], "text/plain");
    assert_eq!(view["size_bytes"], 18);
    assert!(view.get("payload").is_none());

    let id = view["id"].as_str().unwrap();
    let response = app.send(get(&format!("/api/files/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"hello from the lan");
}

#[tokio::test]
async fn disallowed_type_is_415() {
    let app = TestApp::new();
    let response = app
        .send(multipart_upload(
            "file",
            "setup.exe",
            "application/x-msdownload",
            b"MZ",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(app.relay.store_len(), 0);
}

#[tokio::test]
async fn oversized_file_is_413() {
    let limits = ContentLimits {
        max_file_size: 8,
        ..ContentLimits::default()
    };
    let app = TestApp::with(limits, StreamConfig::default());
    let response = app
        .send(multipart_upload(
            "file",
            "big.bin",
            "application/octet-stream",
            b"0123456789",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn untyped_part_is_shared_as_octet_stream() {
    let app = TestApp::new();
    let response = app
        .send(multipart_request("file", "blob.dat", None, b"\x00\x01"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let view = json_body(response).await;
    assert_eq!(view["mime_type"], "application/octet-stream");

    let id = view["id"].as_str().unwrap();
    let response = app.send(get(&format!("/api/files/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
}

#[tokio::test]
async fn untyped_part_is_415_when_octet_stream_is_not_allowed() {
    let limits = ContentLimits {
        allowed_mime_types: vec!["text/plain".into()],
        ..ContentLimits::default()
    };
    let app = TestApp::with(limits, StreamConfig::default());
    let response = app
        .send(multipart_request("file", "blob.dat", None, b"\x00\x01"))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(app.relay.store_len(), 0);
}

#[tokio::test]
async fn upload_without_file_field_is_400() {
    let app = TestApp::new();
    let response = app
        .send(multipart_upload("attachment", "a.txt", "text/plain", b"a"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn downloading_text_entry_is_404() {
    let app = TestApp::new();
    let view = share_text(&app, "not a file", false).await;
    let id = view["id"].as_str().unwrap();
    let response = app.send(get(&format!("/api/files/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Expiry -----------------------------------------------------------------

#[tokio::test]
async fn unknown_id_is_404() {
    let app = TestApp::new();
    let response = app.send(get("/api/content/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"], "content not found: nope");
}

#[tokio::test]
async fn expired_entry_is_410_then_404() {
    let app = TestApp::new();
    let view = share_text(&app, "short lived", false).await;
    let id = view["id"].as_str().unwrap().to_owned();

    app.clock.advance(chrono::Duration::seconds(9 * 60 + 59));
    let response = app.send(get(&format!("/api/content/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.clock.advance(chrono::Duration::seconds(2));
    let response = app.send(get(&format!("/api/content/{id}"))).await;
    assert_eq!(response.status(), StatusCode::GONE);

    let response = app.send(get(&format!("/api/content/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let listed = json_body(app.send(get("/api/content")).await).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn metrics_count_shares() {
    let app = TestApp::new();
    share_text(&app, "one", false).await;
    app.send(multipart_upload("file", "a.png", "image/png", b"\x89PNG"))
        .await;

    let json = json_body(app.send(get("/metrics")).await).await;
    assert_eq!(json["texts_shared"], 1);
    assert_eq!(json["files_shared"], 1);
    assert_eq!(json["bytes_shared"], 4);
}

// -- Event stream -----------------------------------------------------------

#[tokio::test]
async fn event_stream_starts_with_snapshot_and_follows_shares() {
    let app = TestApp::new();
    share_text(&app, "already here", false).await;

    let response = app.send(get("/api/events")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    assert_eq!(app.relay.observer_count(), 1);

    let mut body = response.into_body().into_data_stream();
    let head = read_until(&mut body, "event: client-count").await;
    assert!(head.starts_with("event: initial-snapshot"));
    assert!(head.contains("already here"));

    share_text(&app, "fresh", false).await;
    let next = read_until(&mut body, "event: content-added").await;
    assert!(next.contains("fresh"));

    drop(body);
    assert_eq!(app.relay.observer_count(), 0);
}

#[tokio::test]
async fn event_stream_announces_expiry() {
    let app = TestApp::new();
    let view = share_text(&app, "going away", false).await;
    let id = view["id"].as_str().unwrap().to_owned();

    let response = app.send(get("/api/events")).await;
    let mut body = response.into_body().into_data_stream();
    read_until(&mut body, "event: client-count").await;

    app.clock.advance(chrono::Duration::minutes(11));
    let report = app.relay.sweep_expired(app.clock.now());
    assert_eq!(report.removed.len(), 1);

    let removed = read_until(&mut body, "event: content-removed").await;
    assert!(removed.contains(&id));
}

#[tokio::test]
async fn observer_limit_returns_429() {
    let stream = StreamConfig {
        max_observers: 1,
        ..StreamConfig::default()
    };
    let app = TestApp::with(ContentLimits::default(), stream);

    let first = app.send(get("/api/events")).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.send(get("/api/events")).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    drop(first);
    let third = app.send(get("/api/events")).await;
    assert_eq!(third.status(), StatusCode::OK);
}

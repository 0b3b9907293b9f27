//! HTTP front door: upload page, multipart upload and monitoring endpoints.

mod helpers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use domain_analyzer::{serve, AppState, LookupError, OcrError, Pipeline, TrafficQuery};

use helpers::{enricher, Behavior, FakeLookup, FakeRecognizer, PNG_BYTES};

struct TestServer {
    base_url: String,
    shutdown: CancellationToken,
    _web_root: TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn write_web_root(root: &Path) {
    std::fs::create_dir_all(root.join("template")).unwrap();
    std::fs::create_dir_all(root.join("static")).unwrap();
    std::fs::write(
        root.join("template").join("index.html"),
        "<html><body><form id=\"upload\"></form></body></html>",
    )
    .unwrap();
    std::fs::write(root.join("static").join("style.css"), "body { margin: 0; }").unwrap();
}

async fn start(pipeline: Pipeline) -> TestServer {
    let web_root = TempDir::new().expect("Failed to create temp directory");
    write_web_root(web_root.path());

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        Arc::new(pipeline),
        TrafficQuery::default(),
        web_root.path().to_path_buf(),
    )
    .with_shutdown(shutdown.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(serve(listener, state));

    TestServer {
        base_url,
        shutdown,
        _web_root: web_root,
    }
}

fn pipeline_with_ocr(lines: &[&str]) -> Pipeline {
    let traffic = FakeLookup::succeeding().with_host(
        "down.org",
        Behavior::Fail(LookupError::unavailable("HTTP 502")),
    );
    Pipeline::new(Arc::new(enricher(
        FakeLookup::succeeding(),
        traffic,
        4,
        Duration::from_secs(5),
    )))
    .with_recognizer(Arc::new(FakeRecognizer::lines(lines)))
}

fn image_form(bytes: &'static [u8]) -> Form {
    Form::new().part(
        "image",
        Part::bytes(bytes)
            .file_name("screenshot.png")
            .mime_str("image/png")
            .unwrap(),
    )
}

#[tokio::test]
async fn test_upload_returns_analyses_in_envelope() {
    let server = start(pipeline_with_ocr(&["Visit example.com", "status at down.org"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/upload", server.base_url))
        .multipart(image_form(PNG_BYTES).text("start_date", "2023-01"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["domain"], "example.com");
    assert!(data[0]["archive"]["captured_at"].is_string());
    assert!(data[0]["traffic"]["visits"].is_array());
    assert!(data[0].get("failures").is_none());

    assert_eq!(data[1]["domain"], "down.org");
    assert!(data[1]["traffic"].is_null());
    assert_eq!(data[1]["failures"][0]["source"], "traffic");
    assert_eq!(data[1]["failures"][0]["kind"], "unavailable");
    assert_eq!(body["msg"], "1 lookup(s) failed for 1 of 2 domain(s)");
}

#[tokio::test]
async fn test_upload_without_image_is_bad_request() {
    let server = start(pipeline_with_ocr(&["example.com"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/upload", server.base_url))
        .multipart(Form::new().text("country", "us"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["data"].is_null());
    assert!(body["msg"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_upload_with_bad_query_field_is_bad_request() {
    let server = start(pipeline_with_ocr(&["example.com"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/upload", server.base_url))
        .multipart(image_form(PNG_BYTES).text("start_date", "last spring"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_with_no_domains_returns_empty_list() {
    let server = start(pipeline_with_ocr(&["nothing useful here"])).await;

    let response = reqwest::Client::new()
        .post(format!("{}/upload", server.base_url))
        .multipart(image_form(PNG_BYTES))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["msg"], "");
}

#[tokio::test]
async fn test_upload_ocr_failures_map_to_status_codes() {
    let make_enricher = || {
        Arc::new(enricher(
            FakeLookup::succeeding(),
            FakeLookup::succeeding(),
            2,
            Duration::from_secs(5),
        ))
    };

    let unreadable = start(
        Pipeline::new(make_enricher()).with_recognizer(Arc::new(FakeRecognizer::error(
            OcrError::InvalidImage("not an image".into()),
        ))),
    )
    .await;
    let response = reqwest::Client::new()
        .post(format!("{}/upload", unreadable.base_url))
        .multipart(image_form(PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let service_down = start(
        Pipeline::new(make_enricher()).with_recognizer(Arc::new(FakeRecognizer::error(
            OcrError::Service("throttled".into()),
        ))),
    )
    .await;
    let response = reqwest::Client::new()
        .post(format!("{}/upload", service_down.base_url))
        .multipart(image_form(PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let no_ocr = start(Pipeline::new(make_enricher())).await;
    let response = reqwest::Client::new()
        .post(format!("{}/upload", no_ocr.base_url))
        .multipart(image_form(PNG_BYTES))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_upload() {
    let hanging = Pipeline::new(Arc::new(enricher(
        FakeLookup::new(Behavior::Hang),
        FakeLookup::new(Behavior::Hang),
        4,
        Duration::from_secs(60),
    )))
    .with_recognizer(Arc::new(FakeRecognizer::lines(&["example.com"])));
    let server = start(hanging).await;

    let upload = tokio::spawn(
        reqwest::Client::new()
            .post(format!("{}/upload", server.base_url))
            .multipart(image_form(PNG_BYTES))
            .send(),
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.shutdown.cancel();

    let response = tokio::time::timeout(Duration::from_secs(5), upload)
        .await
        .expect("upload did not finish after shutdown")
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_index_and_static_assets_are_served() {
    let server = start(pipeline_with_ocr(&[])).await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("id=\"upload\""));

    let css = client
        .get(format!("{}/static/style.css", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(css.text().await.unwrap(), "body { margin: 0; }");
}

#[tokio::test]
async fn test_status_and_metrics_reflect_lookups() {
    let server = start(pipeline_with_ocr(&["example.com down.org"])).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/upload", server.base_url))
        .multipart(image_form(PNG_BYTES))
        .send()
        .await
        .unwrap();

    let status: serde_json::Value = client
        .get(format!("{}/status", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["ocr_enabled"], true);
    assert_eq!(status["batches"], 1);
    assert_eq!(status["domains_analyzed"], 2);
    assert_eq!(status["failed_lookups"], 1);
    assert_eq!(status["available_lookup_slots"], 4);
    assert_eq!(status["lookups"]["traffic"]["unavailable"], 1);
    assert_eq!(status["lookups"]["archive"]["success"], 2);

    let metrics = client
        .get(format!("{}/metrics", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("domain_analyzer_domains_total 2"));
    assert!(metrics
        .contains("domain_analyzer_lookups_total{source=\"traffic\",outcome=\"unavailable\"} 1"));
}

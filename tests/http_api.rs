//! REST surface tests driven through the router with `tower::oneshot`.
//! Field detection runs against the engine handle directly so the flows
//! stay deterministic; the HTTP layer is exercised for everything else.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use docfill::config::EngineConfig;
use docfill::document::DocumentText;
use docfill::engine::FillEngine;

#[path = "helpers/fixtures.rs"]
mod fixtures;

use fixtures::*;

fn app_without_oracle(data_dir: &std::path::Path) -> Router {
    let config = EngineConfig {
        data_dir: data_dir.to_path_buf(),
        ..EngineConfig::default()
    };
    docfill::api::router(Arc::new(FillEngine::with_oracle(config, None)))
}

fn app_with(replies: Vec<Result<String, ()>>, data_dir: &std::path::Path) -> (Router, Arc<FillEngine>) {
    let config = EngineConfig {
        data_dir: data_dir.to_path_buf(),
        ..EngineConfig::default()
    };
    let oracle = ScriptedOracle::new(replies);
    let engine = Arc::new(FillEngine::with_oracle(config, Some(oracle)));
    (docfill::api::router(engine.clone()), engine)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("failed to parse JSON body")
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_without_oracle(dir.path());

    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_requires_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_without_oracle(dir.path());

    let resp = app
        .oneshot(post_json("/v1/documents", json!({"filename": "empty.txt"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "document text is required");
}

#[tokio::test]
async fn test_register_and_fetch_document() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_without_oracle(dir.path());

    let resp = app
        .clone()
        .oneshot(post_json(
            "/v1/documents",
            json!({"filename": "safe.txt", "text": SAFE_TEXT}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["filename"], "safe.txt");
    assert_eq!(created["status"], "registered");
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(get(&format!("/v1/documents/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["id"].as_str().unwrap(), id);
}

#[tokio::test]
async fn test_unknown_document_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_without_oracle(dir.path());

    let resp = app
        .oneshot(get(&format!("/v1/documents/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_session_for_unknown_document_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_without_oracle(dir.path());

    let resp = app
        .oneshot(post_json(
            "/v1/sessions",
            json!({"document_id": Uuid::new_v4()}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_render_and_download_flow() {
    let dir = tempfile::tempdir().unwrap();
    let (app, engine) = app_with(
        vec![Ok(detection_json()), Ok(accept_json("Acme Corp"))],
        dir.path(),
    );

    let record = engine
        .register_document("safe.txt", DocumentText::from_plain_text(SAFE_TEXT))
        .await;
    engine.analyze_document(record.id).await.unwrap();

    let resp = app
        .clone()
        .oneshot(get(&format!("/v1/documents/{}/placeholders", record.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let placeholders = body_json(resp).await;
    assert_eq!(placeholders["total"], 3);
    assert_eq!(placeholders["placeholders"][0]["name"], "company_name");

    let resp = app
        .clone()
        .oneshot(post_json(
            "/v1/sessions",
            json!({"document_id": record.id}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session = body_json(resp).await;
    let session_id = session["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/sessions/{}/chat", session_id),
            json!({"message": "Acme Corp"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reply = body_json(resp).await;
    assert_eq!(reply["progress"]["filled"], 1);
    assert_eq!(reply["progress"]["total"], 3);
    assert!(reply["assistant"].as_str().unwrap().contains("Acme Corp"));

    let resp = app
        .clone()
        .oneshot(get(&format!(
            "/v1/documents/{}/live-preview?session_id={}",
            record.id, session_id
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Acme Corp"));

    let resp = app
        .clone()
        .oneshot(post_json(
            &format!(
                "/v1/documents/{}/render?session_id={}",
                record.id, session_id
            ),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rendered = body_json(resp).await;
    assert!(rendered["filled"]["path"]
        .as_str()
        .unwrap()
        .ends_with("filled.txt"));

    let resp = app
        .clone()
        .oneshot(get(&format!(
            "/v1/documents/{}/download?kind=html",
            record.id
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(content_type, "text/html; charset=utf-8");
    assert!(body_text(resp).await.contains("filled-value"));

    let resp = app
        .oneshot(get(&format!(
            "/v1/documents/{}/download?kind=docx",
            record.id
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_before_render_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_without_oracle(dir.path());

    let resp = app
        .clone()
        .oneshot(post_json(
            "/v1/documents",
            json!({"filename": "safe.txt", "text": SAFE_TEXT}),
        ))
        .await
        .unwrap();
    let created = body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(get(&format!("/v1/documents/{}/download", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

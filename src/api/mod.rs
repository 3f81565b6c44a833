//! REST API for the fill engine
//!
//! Routes:
//! - GET  /health
//! - POST /v1/documents                    - register a document, start field detection
//! - GET  /v1/documents/:id                - document record and status
//! - POST /v1/documents/:id/parse          - re-run field detection
//! - GET  /v1/documents/:id/placeholders   - detected fields in document order
//! - POST /v1/documents/:id/render         - write filled text and HTML preview artifacts
//! - GET  /v1/documents/:id/download       - latest rendered artifact
//! - GET  /v1/documents/:id/live-preview   - preview with current answers, nothing persisted
//! - POST /v1/sessions                     - start a fill session
//! - GET  /v1/sessions/:id                 - session state and chat history
//! - POST /v1/sessions/:id/chat            - one conversational turn

pub mod documents;
pub mod sessions;

use std::sync::Arc;

use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tracing::warn;

use crate::engine::FillEngine;
use crate::error::FillError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FillEngine>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Assemble the full application router.
pub fn router(engine: Arc<FillEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(documents::routes())
        .merge(sessions::routes())
        .with_state(AppState { engine })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn error_response(err: FillError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        FillError::DocumentNotFound(_)
        | FillError::SessionNotFound(_)
        | FillError::FieldNotFound(_)
        | FillError::ArtifactMissing(_) => StatusCode::NOT_FOUND,
        FillError::NoAnswers(_) | FillError::NoFields(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!("request failed: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub(crate) fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

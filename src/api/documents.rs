//! Document endpoints
//!
//! Registration accepts either raw text (split into paragraphs per line)
//! or an explicit paragraph/table structure. Field detection runs in a
//! background task; poll `GET /v1/documents/:id` for the parse status.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{bad_request, error_response, AppState, ErrorResponse};
use crate::document::{DocumentText, TableText};
use crate::engine::RenderOutput;
use crate::model::{ArtifactKind, DocumentRecord, Field};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub filename: String,
    pub text: Option<String>,
    pub paragraphs: Option<Vec<String>>,
    #[serde(default)]
    pub tables: Vec<TableText>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub document_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PlaceholderListResponse {
    pub placeholders: Vec<Field>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub kind: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/documents", post(register_document))
        .route("/v1/documents/:id", get(get_document))
        .route("/v1/documents/:id/parse", post(parse_document))
        .route("/v1/documents/:id/placeholders", get(list_placeholders))
        .route("/v1/documents/:id/render", post(render_document))
        .route("/v1/documents/:id/download", get(download_artifact))
        .route("/v1/documents/:id/live-preview", get(live_preview))
}

/// POST /v1/documents
async fn register_document(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<DocumentRecord>), (StatusCode, Json<ErrorResponse>)> {
    let text = match (req.paragraphs, req.text) {
        (Some(paragraphs), _) => DocumentText {
            paragraphs,
            tables: req.tables,
        },
        (None, Some(raw)) if !raw.trim().is_empty() => DocumentText::from_plain_text(&raw),
        _ => return Err(bad_request("document text is required")),
    };

    let record = state.engine.register_document(req.filename, text).await;
    spawn_analysis(&state, record.id);

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/documents/:id
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentRecord>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .document(id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /v1/documents/:id/parse
async fn parse_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParseResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.engine.document(id).await.map_err(error_response)?;
    spawn_analysis(&state, id);

    Ok(Json(ParseResponse {
        document_id: id,
        message: "Parsing started".to_string(),
    }))
}

/// GET /v1/documents/:id/placeholders
async fn list_placeholders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaceholderListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let placeholders = state.engine.fields(id).await.map_err(error_response)?;
    let total = placeholders.len();

    Ok(Json(PlaceholderListResponse {
        placeholders,
        total,
    }))
}

/// POST /v1/documents/:id/render?session_id=
async fn render_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<RenderOutput>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .render(id, query.session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /v1/documents/:id/download?kind=text|html
async fn download_artifact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let (kind, content_type) = match query.kind.as_deref().unwrap_or("text") {
        "text" => (ArtifactKind::FilledText, "text/plain; charset=utf-8"),
        "html" => (ArtifactKind::HtmlPreview, "text/html; charset=utf-8"),
        other => return Err(bad_request(format!("unknown artifact kind '{}'", other))),
    };

    let content = state
        .engine
        .artifact_content(id, kind)
        .await
        .map_err(error_response)?;

    Ok(([(header::CONTENT_TYPE, content_type)], content).into_response())
}

/// GET /v1/documents/:id/live-preview?session_id=
async fn live_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Html<String>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .live_preview(id, query.session_id)
        .await
        .map(Html)
        .map_err(error_response)
}

fn spawn_analysis(state: &AppState, document_id: Uuid) {
    let engine = state.engine.clone();
    tokio::spawn(async move {
        if let Err(err) = engine.analyze_document(document_id).await {
            warn!("field detection for document {} failed: {}", document_id, err);
        }
    });
}

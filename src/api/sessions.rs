//! Session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{error_response, AppState, ErrorResponse};
use crate::engine::TurnReply;
use crate::model::FillSession;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub document_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/:id", get(get_session))
        .route("/v1/sessions/:id/chat", post(chat))
}

/// POST /v1/sessions
async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<FillSession>), (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .create_session(req.document_id)
        .await
        .map(|session| (StatusCode::CREATED, Json(session)))
        .map_err(error_response)
}

/// GET /v1/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FillSession>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .session(id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /v1/sessions/:id/chat
async fn chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<TurnReply>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .process_turn(id, &req.message)
        .await
        .map(Json)
        .map_err(error_response)
}

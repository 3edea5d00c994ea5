// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route handlers.

use crate::{auth, body};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use confab_analytics::AnalyticsEngine;
use confab_core::SessionId;
use confab_protocol::{
    error_code, AnalyticsResponse, CheckRequest, CheckResponse, ChunkRequest, ChunkResponse,
    ErrorBody, InitRequest, InitResponse, ValidateResponse, ROUTE_AUTH_VALIDATE,
    ROUTE_SESSIONS_CHECK, ROUTE_SYNC_CHUNK, ROUTE_SYNC_INIT,
};
use confab_store::{StoreError, SyncStore};
use std::sync::Arc;
use tracing::error;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SyncStore>,
    pub engine: AnalyticsEngine,
    pub api_key: Arc<String>,
}

/// Build the full router: authenticated API plus the open validate probe.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ROUTE_SYNC_INIT, post(sync_init))
        .route(ROUTE_SYNC_CHUNK, post(sync_chunk))
        .route(ROUTE_SESSIONS_CHECK, post(sessions_check))
        .route("/sessions/{id}/analytics", get(session_analytics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .route(ROUTE_AUTH_VALIDATE, get(auth_validate))
        .layer(middleware::from_fn(body::decompress_request))
        .with_state(state)
}

/// Store errors mapped onto wire status codes.
struct ApiFailure(StoreError);

impl From<StoreError> for ApiFailure {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            StoreError::CursorConflict { stored } => {
                (StatusCode::CONFLICT, ErrorBody::cursor_conflict(stored))
            }
            StoreError::UnknownSession(id) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new(error_code::NOT_FOUND, format!("unknown session {id}")),
            ),
            StoreError::InvalidChunk(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(error_code::PROTOCOL_MALFORMED, message),
            ),
            StoreError::LineTooLarge { line, bytes } => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    error_code::LINE_TOO_LARGE,
                    format!("line {line} is {bytes} bytes"),
                ),
            ),
            e => {
                error!("internal store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(error_code::INTERNAL, "internal error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn sync_init(
    State(state): State<AppState>,
    Json(req): Json<InitRequest>,
) -> Result<Json<InitResponse>, ApiFailure> {
    Ok(Json(state.store.init_session(&req)?))
}

async fn sync_chunk(
    State(state): State<AppState>,
    Json(req): Json<ChunkRequest>,
) -> Result<Json<ChunkResponse>, ApiFailure> {
    let new_cursor = state.store.append_chunk(&req).await?;
    Ok(Json(ChunkResponse { new_cursor }))
}

async fn sessions_check(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Json<CheckResponse> {
    Json(state.store.check_existing(&req.external_ids))
}

async fn session_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalyticsResponse>, ApiFailure> {
    let store = Arc::clone(&state.store);
    let engine = state.engine;
    let session_id = SessionId::new(id);

    // Card recompute reads line files; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || engine.read(&store, &session_id))
        .await
        .map_err(|e| ApiFailure(StoreError::Io(std::io::Error::other(e))))??;

    Ok(Json(AnalyticsResponse {
        computed_at: result.computed_at.to_rfc3339(),
        computed_lines: result.computed_lines,
        cards: result.cards,
        card_errors: (!result.errors.is_empty()).then_some(result.errors),
    }))
}

async fn auth_validate(State(state): State<AppState>, headers: HeaderMap) -> Json<ValidateResponse> {
    let valid = auth::bearer_token(&headers) == Some(state.api_key.as_str());
    Json(ValidateResponse { valid })
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

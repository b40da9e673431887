//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for the chat
//! companion. It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    models::{ChatPayload, ChatResponse, ErrorResponse, HealthResponse},
    state::AppState,
};

pub const MESSAGE_REQUIRED: &str = "Message is required";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                warn!(%error, "Rejecting bad request");
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}

/// Get a reply from the companion.
///
/// Upstream failures never surface here: they come back as a fallback reply.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "Companion reply", body = ChatResponse),
        (status = 400, description = "Missing or empty message", body = ErrorResponse)
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload
        .ok()
        .and_then(|Json(payload)| payload.message)
        .filter(|message| !message.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MESSAGE_REQUIRED.to_string()))?;

    info!(chars = message.chars().count(), "Chat request received");
    let reply = state.reply_service.respond(&message).await;
    Ok(Json(reply.into()))
}

/// Report that the service is up.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running".to_string(),
        timestamp: Utc::now(),
    })
}

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload
        .map_err(|err| AppError::BadRequest(format!("invalid request body: {err}")))?;

    // Correlation id so the upstream diagnostics can be matched to a request.
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        message = %request.message,
        has_image = request.image_data.is_some(),
        "chat request received"
    );

    let reply = state
        .upstream
        .generate(&request.message, request.image_data.as_deref())
        .await
        .inspect_err(|err| error!(%request_id, "chat request failed: {err}"))?;

    info!(%request_id, "reply ready ({} chars)", reply.chars().count());

    Ok(Json(ChatResponse {
        success: true,
        message: reply,
    }))
}

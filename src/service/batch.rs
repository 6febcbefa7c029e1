use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::error::AppError;
use crate::service::collect_batch;
use crate::utils::state::AppState;

/// POST /api/background-upload
///
/// Answers with the session id as soon as the batch is registered; the
/// uploads themselves settle in the background and are observable through
/// the status endpoint and the progress WebSocket.
pub async fn background_upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let files = collect_batch(multipart).await?;
    let session_id = state.orchestrator.begin_batch(files).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "sessionId": session_id })),
    ))
}

/// GET /api/upload-status/{session_id}
pub async fn upload_status_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .orchestrator
        .get_status(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session `{session_id}`")))?;

    Ok(Json(session))
}

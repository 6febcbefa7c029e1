use std::sync::Arc;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path, State};
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use tokio::io;

use crate::error::AppError;
use crate::session::FileOutcome;
use crate::service::collect_batch;
use crate::utils::state::AppState;
use crate::utils::validation::{is_valid_file_id, is_valid_file_name};

#[derive(Deserialize)]
pub struct UploadUrlRequest {
    #[serde(default)]
    files: Vec<UploadUrlEntry>,
}

#[derive(Deserialize)]
struct UploadUrlEntry {
    name: String,
}

/// POST /api/get-upload-url
pub async fn get_upload_urls_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadUrlRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.files.is_empty() {
        return Err(AppError::BadRequest("files array is required".to_string()));
    }

    let mut upload_urls = Vec::with_capacity(request.files.len());
    for file in &request.files {
        if !is_valid_file_name(&file.name) {
            return Err(AppError::BadRequest(format!(
                "invalid file name `{}`",
                file.name
            )));
        }
        upload_urls.push(state.storage.allocate(&file.name).await?);
    }

    Ok(Json(json!({ "uploadUrls": upload_urls })))
}

/// POST /api/upload-multiple
pub async fn upload_multiple_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let files = collect_batch(multipart).await?;

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let allocated = state.storage.allocate(&file.name).await?;
        state
            .storage
            .write(&allocated.file_id, file.bytes.clone())
            .await?;
        results.push(FileOutcome {
            original_name: file.name,
            file_id: allocated.file_id,
            size: file.bytes.len() as u64,
            mime_type: file.mime_type,
        });
    }

    Ok(Json(json!({
        "message": "Files uploaded successfully",
        "files": results,
    })))
}

/// PUT /api/upload/{file_id}
pub async fn put_upload_handler(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if !is_valid_file_id(&file_id) {
        return Err(AppError::BadRequest(format!("invalid file id `{file_id}`")));
    }
    if body.is_empty() {
        return Err(AppError::BadRequest("no file provided".to_string()));
    }

    state.storage.write(&file_id, body).await?;

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "fileId": file_id,
    })))
}

/// GET /api/download/{file_id}
pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_valid_file_id(&file_id) {
        return Err(AppError::BadRequest(format!("invalid file id `{file_id}`")));
    }

    let bytes = state.storage.read(&file_id).await.map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            AppError::NotFound(format!("file `{file_id}`"))
        } else {
            AppError::Io(err)
        }
    })?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_id}\""),
        )
        .body(Body::from(bytes))
        .unwrap())
}

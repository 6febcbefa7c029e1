use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Axum error: {0}")]
    Axum(#[from] axum::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Generating response for AppError: {:?}", self);

        let (status_code, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                (StatusCode::NOT_FOUND, "file not found".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "an internal server error occurred".to_string(),
            ),
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

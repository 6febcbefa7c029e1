use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::service::batch::{background_upload_handler, upload_status_handler};
use crate::service::upload::{
    download_handler, get_upload_urls_handler, put_upload_handler, upload_multiple_handler,
};
use crate::service::ws::ws_handler;
use crate::utils::state::AppState;

const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", upload_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn upload_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get-upload-url", post(get_upload_urls_handler))
        .route("/upload-multiple", post(upload_multiple_handler))
        .route("/upload/{file_id}", put(put_upload_handler))
        .route("/download/{file_id}", get(download_handler))
        .route("/background-upload", post(background_upload_handler))
        .route("/upload-status/{session_id}", get(upload_status_handler))
        .route("/ws", get(ws_handler))
}

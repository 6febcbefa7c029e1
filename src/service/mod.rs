use axum::extract::Multipart;

use crate::error::AppError;
use crate::session::PendingFile;
use crate::utils::validation::is_valid_file_name;

pub mod batch;
pub mod upload;
pub mod ws;

pub(crate) const MAX_BATCH_FILES: usize = 10;

/// Drain a multipart request into fully buffered files. Fields without a
/// file name are ignored; an empty batch or one over the limit is a client
/// error.
pub(crate) async fn collect_batch(mut multipart: Multipart) -> Result<Vec<PendingFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !is_valid_file_name(&name) {
            return Err(AppError::BadRequest(format!("invalid file name `{name}`")));
        }
        if files.len() == MAX_BATCH_FILES {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_BATCH_FILES} files are allowed per batch"
            )));
        }

        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await?;
        files.push(PendingFile {
            name,
            mime_type,
            bytes,
        });
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("no files provided".to_string()));
    }
    Ok(files)
}

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs::{create_dir_all, read, write};
use tokio::io;

use crate::storage::{AllocatedUpload, Storage, unique_file_id};

/// Stores every file flat under a root directory, keyed by its file id.
/// The upload URL points back at the service's own raw-upload endpoint.
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FilesystemStorage {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn file_path(&self, file_id: &str) -> PathBuf {
        self.root.join(file_id)
    }
}

#[async_trait::async_trait]
impl Storage for FilesystemStorage {
    async fn allocate(&self, name: &str) -> io::Result<AllocatedUpload> {
        let file_id = unique_file_id(name);
        Ok(AllocatedUpload {
            upload_url: format!("/api/upload/{file_id}"),
            file_id,
        })
    }

    async fn write(&self, file_id: &str, bytes: Bytes) -> io::Result<()> {
        create_dir_all(&self.root).await?;
        write(self.file_path(file_id), &bytes).await
    }

    async fn read(&self, file_id: &str) -> io::Result<Bytes> {
        Ok(Bytes::from(read(self.file_path(file_id)).await?))
    }
}

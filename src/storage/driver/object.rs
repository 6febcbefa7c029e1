use bytes::Bytes;
use tokio::io;

use crate::storage::{AllocatedUpload, Storage, unique_file_id};

/// Remote object store addressed over plain HTTP: one object per file id
/// under `<base_url>/<container>/`. Clients given an allocation can PUT to
/// the object URL directly instead of relaying bytes through this service.
pub struct ObjectStorage {
    base_url: String,
    container: String,
    client: reqwest::Client,
}

impl ObjectStorage {
    pub fn new(base_url: &str, container: &str) -> Self {
        ObjectStorage {
            base_url: base_url.trim_end_matches('/').to_string(),
            container: container.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, file_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.container, file_id)
    }
}

#[async_trait::async_trait]
impl Storage for ObjectStorage {
    async fn allocate(&self, name: &str) -> io::Result<AllocatedUpload> {
        let file_id = unique_file_id(name);
        Ok(AllocatedUpload {
            upload_url: self.object_url(&file_id),
            file_id,
        })
    }

    async fn write(&self, file_id: &str, bytes: Bytes) -> io::Result<()> {
        let response = self
            .client
            .put(self.object_url(file_id))
            .body(bytes)
            .send()
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        if !response.status().is_success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("object store returned {} for PUT", response.status()),
            ));
        }
        Ok(())
    }

    async fn read(&self, file_id: &str) -> io::Result<Bytes> {
        let response = self
            .client
            .get(self.object_url(file_id))
            .send()
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("object `{file_id}` does not exist"),
            ));
        }
        if !response.status().is_success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("object store returned {} for GET", response.status()),
            ));
        }

        response
            .bytes()
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
    }
}

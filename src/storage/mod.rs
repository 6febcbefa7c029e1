use bytes::Bytes;
use serde::Serialize;
use tokio::io;

pub mod driver;

/// Destination handed out by [`Storage::allocate`]: the URL a client should
/// PUT bytes to, and the identifier the bytes will be stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedUpload {
    pub upload_url: String,
    pub file_id: String,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Reserve a destination for `name` without transferring any bytes.
    async fn allocate(&self, name: &str) -> io::Result<AllocatedUpload>;
    async fn write(&self, file_id: &str, bytes: Bytes) -> io::Result<()>;
    async fn read(&self, file_id: &str) -> io::Result<Bytes>;
}

/// Storage identifiers are `<16-byte-random-hex>-<original name>` and double
/// as the externally visible file id.
pub fn unique_file_id(name: &str) -> String {
    let raw: [u8; 16] = rand::random();
    format!("{}-{}", hex::encode(raw), name)
}

//! Object storage seam used by the media pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage request for `{path}` failed: {message}")]
    Request { path: String, message: String },
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn request(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Request {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` at `path`, replacing nothing: paths are unique per upload.
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Public URL for a stored path. Pure string construction.
    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`ObjectStorage::public_url`]. `None` when the URL does not
    /// point into the bucket.
    fn path_from_url(&self, url: &str) -> Option<String>;

    async fn health_check(&self) -> Result<(), StorageError>;
}

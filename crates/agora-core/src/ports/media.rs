//! Media store port - where uploaded images and videos live.

use async_trait::async_trait;

use crate::domain::MediaKind;

/// Binary content submitted with a request, before it is stored.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Declared content type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Stable public URL.
    pub url: String,
    /// Identifier accepted by [`MediaStore::delete`].
    pub public_id: String,
}

/// Media store trait - abstraction over blob storage backends.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` and return where they can be fetched from.
    async fn upload(
        &self,
        bytes: &[u8],
        kind: MediaKind,
        content_type: &str,
    ) -> Result<StoredMedia, MediaError>;

    /// Remove a stored object.
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Media store errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media object not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Delete failed: {0}")]
    Delete(String),
}

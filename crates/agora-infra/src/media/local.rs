//! Filesystem-backed media store.
//!
//! Objects are written flat under a root directory as `<uuid>.<ext>` and
//! served back by the API under `base_url`. The file name is the public id.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use agora_core::domain::MediaKind;
use agora_core::ports::{MediaError, MediaStore, StoredMedia};

/// A stored object read back for serving.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a public id to a path inside the root, refusing anything that
    /// could escape it.
    fn path_for(&self, public_id: &str) -> Result<PathBuf, MediaError> {
        let valid = !public_id.is_empty()
            && !public_id.starts_with('.')
            && public_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');

        if !valid {
            return Err(MediaError::NotFound(public_id.to_string()));
        }

        Ok(self.root.join(public_id))
    }

    fn extension(kind: MediaKind, content_type: &str) -> &'static str {
        mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first().copied())
            .unwrap_or(match kind {
                MediaKind::Image => "img",
                MediaKind::Video => "video",
            })
    }

    /// Read an object back together with the content type implied by its
    /// extension.
    pub async fn read(&self, public_id: &str) -> Result<MediaFile, MediaError> {
        let path = self.path_for(public_id)?;

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => MediaError::NotFound(public_id.to_string()),
            _ => MediaError::Upload(e.to_string()),
        })?;

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(MediaFile {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        bytes: &[u8],
        kind: MediaKind,
        content_type: &str,
    ) -> Result<StoredMedia, MediaError> {
        let public_id = format!("{}.{}", Uuid::new_v4(), Self::extension(kind, content_type));
        let path = self.path_for(&public_id)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        tracing::debug!(public_id = %public_id, size = bytes.len(), kind = %kind, "Media stored");

        Ok(StoredMedia {
            url: format!("{}/{}", self.base_url, public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let path = self.path_for(public_id)?;

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => MediaError::NotFound(public_id.to_string()),
                _ => MediaError::Delete(e.to_string()),
            })?;

        tracing::debug!(public_id = %public_id, "Media deleted");
        Ok(())
    }
}

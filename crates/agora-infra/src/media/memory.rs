//! In-memory media store - used in tests and when no media root is writable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use agora_core::domain::MediaKind;
use agora_core::ports::{MediaError, MediaStore, StoredMedia};

/// Keeps uploaded objects in a map. Uploads and deletes can be switched to
/// fail to exercise error paths.
#[derive(Default)]
pub struct InMemoryMediaStore {
    objects: RwLock<HashMap<String, (MediaKind, Vec<u8>)>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, public_id: &str) -> bool {
        self.objects.read().await.contains_key(public_id)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(
        &self,
        bytes: &[u8],
        kind: MediaKind,
        _content_type: &str,
    ) -> Result<StoredMedia, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Upload("media store unavailable".into()));
        }

        let public_id = format!("{kind}-{}", Uuid::new_v4());
        self.objects
            .write()
            .await
            .insert(public_id.clone(), (kind, bytes.to_vec()));

        Ok(StoredMedia {
            url: format!("memory://{public_id}"),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Delete("media store unavailable".into()));
        }

        match self.objects.write().await.remove(public_id) {
            Some(_) => Ok(()),
            None => Err(MediaError::NotFound(public_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failure_switches_apply() {
        let store = InMemoryMediaStore::new();
        let stored = store.upload(b"x", MediaKind::Image, "image/png").await.unwrap();

        store.fail_deletes(true);
        assert!(matches!(
            store.delete(&stored.public_id).await,
            Err(MediaError::Delete(_))
        ));
        assert!(store.contains(&stored.public_id).await);

        store.fail_uploads(true);
        assert!(store.upload(b"y", MediaKind::Image, "image/png").await.is_err());
        assert_eq!(store.len().await, 1);
    }
}

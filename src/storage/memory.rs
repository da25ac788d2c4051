use crate::error::AppError;
use crate::storage::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory object store for tests and local development
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .expect("memory store lock poisoned")
            .contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("memory store lock poisoned").len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<(), AppError> {
        self.objects
            .lock()
            .expect("memory store lock poisoned")
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl_secs: u64) -> Result<String, AppError> {
        if !self.contains(key) {
            return Err(AppError::NotFound(format!("no object at {key}")));
        }
        Ok(format!("memory://{key}?expires_in={ttl_secs}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_presign() {
        let store = MemoryObjectStore::new();
        store
            .put("1/123-enhanced.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        let url = store.presign("1/123-enhanced.png", 3600).await.unwrap();
        assert!(url.starts_with("memory://1/123-enhanced.png"));
    }

    #[tokio::test]
    async fn test_presign_missing_object() {
        let store = MemoryObjectStore::new();
        assert!(store.presign("missing", 3600).await.is_err());
    }
}

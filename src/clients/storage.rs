//! Artifact store adapter
//!
//! Thin wrapper over `object_store` exposing the three primitives the
//! pipeline needs: existence check, get, put. Puts rely on the store's
//! native atomic semantics, so a crashed upload is never observable as a
//! half-written object.

use crate::error::StorageError;
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;

/// Object storage collaborator interface
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
    /// Safe to call twice with identical bytes.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;
}

/// `ArtifactStore` backed by an `object_store` implementation
pub struct ObjectStoreClient {
    store: Arc<dyn ObjectStore>,
    label: String,
}

impl ObjectStoreClient {
    /// Authenticated S3 client for `bucket`. Credentials and region come
    /// from the environment (env vars, AWS config files, instance profile).
    pub fn s3(bucket: &str) -> Result<Self, StorageError> {
        tracing::info!("creating s3 client for bucket: {}", bucket);
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::request_failed(bucket, e))?;
        Ok(Self {
            store: Arc::new(store),
            label: bucket.to_string(),
        })
    }

    /// In-memory store, used by tests and dry runs.
    pub fn in_memory(label: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            label: label.to_string(),
        }
    }

    fn map_err(&self, key: &str, err: object_store::Error) -> StorageError {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                key: format!("{}/{}", self.label, key),
            },
            other => StorageError::request_failed(format!("{}/{}", self.label, key), other),
        }
    }
}

#[async_trait]
impl ArtifactStore for ObjectStoreClient {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.store.head(&ObjectPath::from(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.map_err(key, e)),
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let result = self
            .store
            .get(&ObjectPath::from(key))
            .await
            .map_err(|e| self.map_err(key, e))?;
        let bytes = result.bytes().await.map_err(|e| self.map_err(key, e))?;
        Ok(bytes.to_vec())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.store
            .put(&ObjectPath::from(key), PutPayload::from(bytes))
            .await
            .map_err(|e| self.map_err(key, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_put_get_exists() {
        let store = ObjectStoreClient::in_memory("test");

        assert!(!store.exists("a/b.png").await.unwrap());

        store.put("a/b.png", vec![1, 2, 3]).await.unwrap();
        assert!(store.exists("a/b.png").await.unwrap());
        assert_eq!(store.get("a/b.png").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = ObjectStoreClient::in_memory("test");
        match store.get("missing").await {
            Err(StorageError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_twice_with_identical_bytes() {
        let store = ObjectStoreClient::in_memory("test");
        store.put("k", vec![9]).await.unwrap();
        store.put("k", vec![9]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), vec![9]);
    }
}

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::public_url;
use crate::{ByteStream, GetResult, MediaError, MediaResult, MediaStore, PutResult};

/// In-memory object store, mainly for tests and local development.
///
/// Objects become visible only once their whole stream has been read; a
/// stream error leaves nothing behind.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    base_url: String,
    bucket: String,
}

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive public URLs as `{base_url}/{bucket}/{key}`
    pub fn with_public_url<B: Into<String>, K: Into<String>>(mut self, base_url: B, bucket: K) -> Self {
        self.base_url = base_url.into();
        self.bucket = bucket.into();
        self
    }

    /// Raw object bytes, if present
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.read().get(key).map(|o| o.data.clone())
    }

    /// Content type recorded for an object
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().get(key).and_then(|o| o.content_type.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        size_hint: Option<u64>,
        content_type: Option<&str>,
        mut stream: ByteStream,
    ) -> MediaResult<PutResult> {
        let mut data = BytesMut::with_capacity(size_hint.unwrap_or(0).min(1024 * 1024) as usize);
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }

        let data = data.freeze();
        let size_bytes = data.len() as u64;
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.map(str::to_owned),
            },
        );

        Ok(PutResult {
            key: key.to_string(),
            size_bytes,
            etag: None,
        })
    }

    async fn get(&self, key: &str) -> MediaResult<GetResult> {
        let object = self
            .objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| MediaError::not_found(key, "no such key"))?;

        let size_bytes = object.data.len() as u64;
        let data = object.data;
        Ok(GetResult {
            stream: Box::pin(futures::stream::once(async move { Ok(data) })),
            size_bytes,
            content_type: object.content_type,
        })
    }

    async fn delete(&self, key: &str) -> MediaResult<()> {
        // S3 semantics: deleting a missing key succeeds
        self.objects.write().remove(key);
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        public_url(&self.base_url, &self.bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: Vec<std::io::Result<Bytes>>) -> ByteStream {
        Box::pin(futures::stream::iter(parts))
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryStore::new();
        let parts = vec![Ok(Bytes::from_static(b"he")), Ok(Bytes::from_static(b"llo"))];
        let put = store.put("a/b.txt", None, Some("text/plain"), body(parts)).await.unwrap();
        assert_eq!(put.size_bytes, 5);
        assert_eq!(store.content_type("a/b.txt").as_deref(), Some("text/plain"));

        let mut got = store.get("a/b.txt").await.unwrap();
        assert_eq!(got.size_bytes, 5);
        assert_eq!(got.stream.next().await.unwrap().unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn failed_stream_stores_nothing() {
        let store = MemoryStore::new();
        let parts = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        assert!(store.put("k", None, None, body(parts)).await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("nonexistent/key").await.err().unwrap();
        assert!(matches!(err, MediaError::NotFound { .. }));
    }
}

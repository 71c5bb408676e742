use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::{ByteStream, MediaResult, StorageKey};

/// Core object storage operations - must be implemented by all storage backends
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an object from a stream.
    ///
    /// The stream is read until it ends. An error item aborts the write and
    /// must be returned; nothing may be committed under `key` in that case.
    async fn put(
        &self,
        key: &str,
        size_hint: Option<u64>,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> MediaResult<PutResult>;

    /// Open an object for reading. Missing objects yield `MediaError::NotFound`.
    async fn get(&self, key: &str) -> MediaResult<GetResult>;

    /// Delete an object
    async fn delete(&self, key: &str) -> MediaResult<()>;

    /// Public URL of an object; empty when no base URL is configured
    fn url(&self, key: &str) -> String;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub key: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
}

/// Result of a get operation
pub struct GetResult {
    pub stream: ByteStream,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// `{base_url}/{bucket}/{key}`, or an empty string without a base URL
pub fn public_url(base_url: &str, bucket: &str, key: &str) -> String {
    if base_url.is_empty() {
        return String::new();
    }
    format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, key)
}

/// Strategy for generating storage keys
pub trait KeyStrategy: Send + Sync {
    /// Generate a fresh key for an upload of `file_name` at `now`
    fn object_key(&self, file_name: &str, now: DateTime<Utc>) -> StorageKey;
}

/// Default key strategy: YYYY/MM/DD/uuid.ext (UTC)
#[derive(Debug, Clone, Default)]
pub struct DatedKeyStrategy;

impl KeyStrategy for DatedKeyStrategy {
    fn object_key(&self, file_name: &str, now: DateTime<Utc>) -> StorageKey {
        StorageKey(format!(
            "{:04}/{:02}/{:02}/{}{}",
            now.year(),
            now.month(),
            now.day(),
            Uuid::new_v4(),
            extension(file_name)
        ))
    }
}

/// Generate a collision-free key for `file_name` using the current time
pub fn generate_key(file_name: &str) -> StorageKey {
    DatedKeyStrategy.object_key(file_name, Utc::now())
}

/// Extension of the last path element including the leading dot, or "".
pub fn extension(file_name: &str) -> &str {
    let base = file_name.rfind('/').map_or(0, |i| i + 1);
    match file_name[base..].rfind('.') {
        Some(dot) => &file_name[base + dot..],
        None => "",
    }
}

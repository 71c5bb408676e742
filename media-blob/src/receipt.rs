use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::StorageKey;

/// Receipt returned after successfully storing a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub key: StorageKey,
    /// Empty when no public base URL is configured
    pub url: String,
    /// Bytes actually written; authoritative over any advertised size
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadResult {
    pub fn new(key: StorageKey, url: String, size_bytes: u64) -> Self {
        Self {
            key,
            url,
            size_bytes,
            uploaded_at: Utc::now(),
        }
    }

    /// Upload time as RFC 3339 (second precision)
    pub fn uploaded_at_rfc3339(&self) -> String {
        self.uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// A file read fully into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// The requested path; the original filename is not retained
    pub file_name: String,
    pub content: Bytes,
    /// Always the generic type; the uploaded content type is not retained
    pub content_type: String,
    pub size_bytes: u64,
}

/// Location information for a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub key: StorageKey,
    pub url: String,
}

use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::MediaResult;

/// Stream of bytes exchanged between the transport and the storage backend
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Outbound frames of a streaming download
pub type DownloadFrames = Pin<Box<dyn Stream<Item = MediaResult<DownloadFrame>> + Send>>;

/// Path of a stored object, e.g. `2024/01/01/<uuid>.png`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(pub String);

impl StorageKey {
    /// Create from existing string
    pub fn from_string(key: String) -> Self {
        Self(key)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Metadata announced at the start of a transfer.
///
/// On upload it is supplied by the caller and consumed once to build the
/// storage key and content type; it is not persisted. On download only
/// `file_name` is filled (with the requested path).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    /// Advisory size; 0 means unknown
    pub file_size: u64,
    pub content_type: String,
}

impl FileMetadata {
    pub fn new<S: Into<String>>(file_name: S) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Size hint to hand to the store, `None` when unknown
    pub fn size_hint(&self) -> Option<u64> {
        (self.file_size > 0).then_some(self.file_size)
    }

    /// Content type to hand to the store, `None` when not supplied
    pub fn content_type(&self) -> Option<&str> {
        (!self.content_type.is_empty()).then_some(self.content_type.as_str())
    }
}

/// Inbound frame of a streaming upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFrame {
    Metadata(FileMetadata),
    /// An empty payload is accepted and ignored
    Chunk(Bytes),
}

/// Outbound frame of a streaming download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadFrame {
    Metadata(FileMetadata),
    Chunk(Bytes),
}

impl DownloadFrame {
    /// Payload of a chunk frame
    pub fn chunk(&self) -> Option<&Bytes> {
        match self {
            DownloadFrame::Chunk(bytes) => Some(bytes),
            DownloadFrame::Metadata(_) => None,
        }
    }
}

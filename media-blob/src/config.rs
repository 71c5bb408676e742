use crate::conduit::DEFAULT_CONDUIT_DEPTH;

/// Configuration for media transfers
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Payload size of each chunk frame emitted by a streaming download
    pub download_chunk_bytes: usize,

    /// Segments buffered between the upload receive loop and the storage write
    pub conduit_depth: usize,

    /// Content type reported by whole-body downloads
    pub default_content_type: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            download_chunk_bytes: 32 * 1024, // 32KB
            conduit_depth: DEFAULT_CONDUIT_DEPTH,
            default_content_type: "application/octet-stream".to_string(),
        }
    }
}

impl MediaConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set download chunk size (a zero size falls back to one byte)
    pub fn with_download_chunk_bytes(mut self, bytes: usize) -> Self {
        self.download_chunk_bytes = bytes.max(1);
        self
    }

    /// Set conduit depth
    pub fn with_conduit_depth(mut self, depth: usize) -> Self {
        self.conduit_depth = depth.max(1);
        self
    }

    pub fn with_default_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.default_content_type = content_type.into();
        self
    }
}

use std::sync::Arc;

use media_blob::MediaAdapter;

/// Largest accepted NDJSON line or unary request body
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct MediaAxumState {
    pub adapter: Arc<MediaAdapter>,
    pub max_frame_bytes: usize,
}

impl MediaAxumState {
    pub fn new(adapter: MediaAdapter) -> Self {
        Self::from_shared(Arc::new(adapter))
    }

    pub fn from_shared(adapter: Arc<MediaAdapter>) -> Self {
        Self {
            adapter,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

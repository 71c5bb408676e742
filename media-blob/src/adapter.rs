use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::{debug, error, info, warn};

use crate::{
    conduit, ByteStream, DatedKeyStrategy, DownloadFrame, DownloadFrames, DownloadedFile,
    FileInfo, FileMetadata, GetResult, KeyStrategy, MediaConfig, MediaError, MediaResult,
    MediaStore, PutResult, StorageKey, UploadFrame, UploadResult,
};

/// Upper bound for the buffer pre-allocated by whole-body downloads
const MAX_PREALLOC_BYTES: u64 = 8 * 1024 * 1024;

/// The media adapter - bridges transport frames and the storage backend.
///
/// Holds no per-call state; one instance serves all requests concurrently.
pub struct MediaAdapter {
    store: Arc<dyn MediaStore>,
    keys: Arc<dyn KeyStrategy>,
    config: MediaConfig,
}

impl MediaAdapter {
    /// Create a new media adapter
    pub fn new<S: MediaStore + 'static>(store: S, config: MediaConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create from a store handle that is also used elsewhere
    pub fn from_shared(store: Arc<dyn MediaStore>, config: MediaConfig) -> Self {
        Self {
            store,
            keys: Arc::new(DatedKeyStrategy),
            config,
        }
    }

    /// Create with custom key strategy
    pub fn with_key_strategy<K: KeyStrategy + 'static>(mut self, keys: K) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    /// Store a file held entirely in memory
    pub async fn upload(
        &self,
        file_name: &str,
        content: Bytes,
        content_type: &str,
    ) -> MediaResult<UploadResult> {
        let key = self.keys.object_key(file_name, Utc::now());
        let size = content.len() as u64;
        let body: ByteStream = Box::pin(futures::stream::once(async move { Ok(content) }));
        let content_type = (!content_type.is_empty()).then_some(content_type);

        let stored = self
            .store
            .put(key.as_str(), Some(size), content_type, body)
            .await
            .map_err(|err| {
                error!(file_path = %key, error = %err, "Failed to upload file");
                err.into_internal("failed to upload file")
            })?;
        self.check_stored_key(&key, &stored);

        info!(file_path = %key, original_name = %file_name, size, "File uploaded successfully");
        Ok(self.receipt(key, size))
    }

    /// Store a file sent as one metadata frame followed by chunk frames.
    ///
    /// The storage write runs on its own task and consumes a conduit that
    /// this loop feeds as frames arrive. The two sides meet once, after the
    /// inbound stream ends.
    pub async fn upload_stream<S>(&self, frames: S) -> MediaResult<UploadResult>
    where
        S: Stream<Item = io::Result<UploadFrame>> + Send,
    {
        let mut frames = Box::pin(frames);

        let metadata = match frames.next().await {
            Some(Ok(UploadFrame::Metadata(metadata))) => metadata,
            Some(Ok(UploadFrame::Chunk(_))) | None => {
                return Err(MediaError::invalid("first message must be metadata"));
            }
            Some(Err(err)) => {
                return Err(MediaError::invalid(format!("failed to receive metadata: {err}")));
            }
        };

        let key = self.keys.object_key(&metadata.file_name, Utc::now());
        debug!(file_path = %key, file_name = %metadata.file_name, size_hint = metadata.file_size, "Upload stream started");

        let (mut writer, reader) = conduit::conduit(self.config.conduit_depth);
        let write = {
            let store = Arc::clone(&self.store);
            let key = key.clone();
            let size_hint = metadata.size_hint();
            let content_type = metadata.content_type().map(str::to_owned);
            tokio::spawn(async move {
                store
                    .put(key.as_str(), size_hint, content_type.as_deref(), reader)
                    .await
            })
        };

        let mut reader_gone = false;
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(UploadFrame::Chunk(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    if writer.write(chunk).await.is_err() {
                        reader_gone = true;
                        break;
                    }
                }
                Ok(UploadFrame::Metadata(_)) => {
                    let err = MediaError::invalid("metadata frame received after upload started");
                    writer
                        .close_with_error(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
                        .await;
                    let _ = write.await;
                    return Err(err);
                }
                Err(err) => {
                    warn!(file_path = %key, error = %err, "Upload stream receive failed");
                    writer
                        .close_with_error(io::Error::new(err.kind(), err.to_string()))
                        .await;
                    let _ = write.await;
                    return Err(MediaError::transport(err));
                }
            }
        }

        let total_bytes = writer.written();
        let end = match writer.close().await {
            Ok(end) => Some(end),
            Err(_) => {
                reader_gone = true;
                None
            }
        };

        let stored = match write.await {
            Ok(Ok(stored)) => stored,
            Ok(Err(err)) => {
                error!(file_path = %key, error = %err, "Failed to upload file");
                return Err(err.into_internal("failed to upload file"));
            }
            Err(join_err) => {
                error!(file_path = %key, error = %join_err, "Storage write task failed");
                return Err(MediaError::internal(format!("storage write task failed: {join_err}")));
            }
        };

        if reader_gone || !end.is_some_and(|end| end.reached()) {
            warn!(file_path = %key, stored_bytes = stored.size_bytes, sent_bytes = total_bytes, "Store finished without reading the whole upload");
            if let Err(err) = self.store.delete(key.as_str()).await {
                warn!(file_path = %key, error = %err, "Failed to remove truncated upload");
            }
            return Err(MediaError::internal(
                "failed to upload file: storage stopped reading before end of stream",
            ));
        }
        self.check_stored_key(&key, &stored);

        info!(file_path = %key, original_name = %metadata.file_name, size = total_bytes, "File uploaded successfully");
        Ok(self.receipt(key, total_bytes))
    }

    /// Read a whole file into memory
    pub async fn download(&self, key: &str) -> MediaResult<DownloadedFile> {
        let opened = self.open(key).await?;

        let mut body = opened.stream;
        let mut content = BytesMut::with_capacity(opened.size_bytes.min(MAX_PREALLOC_BYTES) as usize);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| {
                error!(file_path = %key, error = %err, "Failed to read file content");
                MediaError::from(err).into_internal("failed to read file content")
            })?;
            content.extend_from_slice(&chunk);
        }

        let content = content.freeze();
        Ok(DownloadedFile {
            file_name: key.to_string(),
            size_bytes: content.len() as u64,
            content,
            content_type: self.config.default_content_type.clone(),
        })
    }

    /// Open a file as a metadata frame followed by fixed-size chunk frames.
    ///
    /// Fails before producing any frame when the file cannot be opened. A read
    /// error later on ends the stream with an `Internal` error item.
    pub async fn download_stream(&self, key: &str) -> MediaResult<DownloadFrames> {
        let opened = self.open(key).await?;
        let chunk_size = self.config.download_chunk_bytes.max(1);
        let key = key.to_string();

        let frames = async_stream::stream! {
            yield Ok(DownloadFrame::Metadata(FileMetadata::new(key.as_str())));

            let mut body = opened.stream;
            let mut pending = BytesMut::new();
            while let Some(item) = body.next().await {
                match item {
                    Ok(bytes) => {
                        pending.extend_from_slice(&bytes);
                        while pending.len() >= chunk_size {
                            yield Ok(DownloadFrame::Chunk(pending.split_to(chunk_size).freeze()));
                        }
                    }
                    Err(err) => {
                        error!(file_path = %key, error = %err, "Failed to read file");
                        yield Err(MediaError::from(err).into_internal("failed to read file"));
                        return;
                    }
                }
            }
            if !pending.is_empty() {
                yield Ok(DownloadFrame::Chunk(pending.freeze()));
            }
        };

        Ok(Box::pin(frames))
    }

    /// Delete a file
    pub async fn delete(&self, key: &str) -> MediaResult<()> {
        self.store.delete(key).await.map_err(|err| {
            error!(file_path = %key, error = %err, "Failed to delete file");
            err.into_internal("failed to delete file")
        })?;
        info!(file_path = %key, "File deleted successfully");
        Ok(())
    }

    /// Public URL of a file; never touches the store
    pub fn url(&self, key: &str) -> String {
        self.store.url(key)
    }

    /// Location information for a file; never touches the store
    pub fn file_info(&self, key: &str) -> FileInfo {
        FileInfo {
            key: StorageKey::from_string(key.to_string()),
            url: self.url(key),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    async fn open(&self, key: &str) -> MediaResult<GetResult> {
        self.store.get(key).await.map_err(|err| {
            error!(file_path = %key, error = %err, "Failed to open file");
            err.into_not_found(key)
        })
    }

    fn check_stored_key(&self, key: &StorageKey, stored: &PutResult) {
        if stored.key != key.as_str() {
            warn!(file_path = %key, stored_key = %stored.key, "Store reported a different key, keeping the generated one");
        }
    }

    fn receipt(&self, key: StorageKey, size_bytes: u64) -> UploadResult {
        let url = self.store.url(key.as_str());
        UploadResult::new(key, url, size_bytes)
    }
}

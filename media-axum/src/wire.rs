//! JSON shapes exchanged with clients.
//!
//! Field names are camelCase and byte fields are standard base64, matching
//! the protobuf JSON mapping of the media service messages.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use media_blob::{
    DownloadFrame, DownloadedFile, FileInfo, FileMetadata, MediaError, UploadFrame, UploadResult,
};
use serde::{Deserialize, Serialize};

pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_bytes(encoded: &str) -> Result<Bytes, base64::DecodeError> {
    STANDARD.decode(encoded).map(Bytes::from)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadRequest {
    pub file_name: String,
    /// base64
    pub content: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_path: String,
    pub url: String,
    pub file_size: u64,
    pub uploaded_at: String,
}

impl From<UploadResult> for UploadResponse {
    fn from(receipt: UploadResult) -> Self {
        Self {
            uploaded_at: receipt.uploaded_at_rfc3339(),
            file_path: receipt.key.into_string(),
            url: receipt.url,
            file_size: receipt.size_bytes,
        }
    }
}

/// Request of every call addressed by path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilePathRequest {
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub file_name: String,
    pub content: String,
    pub content_type: String,
    pub file_size: u64,
}

impl From<DownloadedFile> for DownloadResponse {
    fn from(file: DownloadedFile) -> Self {
        Self {
            content: encode_bytes(&file.content),
            file_name: file.file_name,
            content_type: file.content_type,
            file_size: file.size_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfoResponse {
    pub file_path: String,
    pub url: String,
}

impl From<FileInfo> for FileInfoResponse {
    fn from(info: FileInfo) -> Self {
        Self {
            file_path: info.key.into_string(),
            url: info.url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataWire {
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
}

impl From<MetadataWire> for FileMetadata {
    fn from(wire: MetadataWire) -> Self {
        FileMetadata::new(wire.file_name)
            .with_file_size(wire.file_size)
            .with_content_type(wire.content_type)
    }
}

impl From<FileMetadata> for MetadataWire {
    fn from(meta: FileMetadata) -> Self {
        Self {
            file_name: meta.file_name,
            file_size: meta.file_size,
            content_type: meta.content_type,
        }
    }
}

/// One NDJSON line of an `UploadStream` request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadStreamLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataWire>,
    /// base64; a line with neither field is an empty chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
}

impl UploadStreamLine {
    pub fn into_frame(self) -> Result<UploadFrame, String> {
        match (self.metadata, self.chunk) {
            (Some(_), Some(_)) => Err("frame carries both metadata and chunk".to_string()),
            (Some(metadata), None) => Ok(UploadFrame::Metadata(metadata.into())),
            (None, Some(chunk)) => decode_bytes(&chunk)
                .map(UploadFrame::Chunk)
                .map_err(|e| format!("chunk is not valid base64: {e}")),
            (None, None) => Ok(UploadFrame::Chunk(Bytes::new())),
        }
    }
}

/// One NDJSON line of a `DownloadStream` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadStreamLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
    /// Terminal line of a stream that failed after it started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl From<DownloadFrame> for DownloadStreamLine {
    fn from(frame: DownloadFrame) -> Self {
        match frame {
            DownloadFrame::Metadata(meta) => Self {
                metadata: Some(meta.into()),
                ..Self::default()
            },
            DownloadFrame::Chunk(bytes) => Self {
                chunk: Some(encode_bytes(&bytes)),
                ..Self::default()
            },
        }
    }
}

impl From<&MediaError> for DownloadStreamLine {
    fn from(err: &MediaError) -> Self {
        Self {
            error: Some(err.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&MediaError> for ErrorBody {
    fn from(err: &MediaError) -> Self {
        Self {
            code: err.code().name().to_string(),
            message: err.to_string(),
        }
    }
}

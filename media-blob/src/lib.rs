//! # media-blob: streaming media storage core
//!
//! `media-blob` stores user files in an S3-compatible object store under
//! date-partitioned, collision-free paths and moves their bytes between a
//! framed transport and the store without buffering whole files.
//!
//! ## Quick Start
//!
//! ```rust
//! use media_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> MediaResult<()> {
//! let store = MemoryStore::new().with_public_url("http://cdn.example.com", "media");
//! let adapter = MediaAdapter::new(store, MediaConfig::default());
//!
//! let receipt = adapter
//!     .upload("hello.txt", bytes::Bytes::from_static(b"Hello, world!"), "text/plain")
//!     .await?;
//! assert!(receipt.key.as_str().ends_with(".txt"));
//!
//! let file = adapter.download(receipt.key.as_str()).await?;
//! assert_eq!(&file.content[..], b"Hello, world!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Transport     │  ← frames in, frames out (HTTP/NDJSON, tests)
//! ├─────────────────┤
//! │  MediaAdapter   │  ← path policy, upload/download bridges, error mapping
//! ├─────────────────┤
//! │   MediaStore    │  ← put / get / delete / url primitives
//! └─────────────────┘
//! ```
//!
//! A streaming upload is bridged through a bounded [`conduit`]: the receive
//! loop writes chunk payloads while a concurrent task hands the reading end
//! to [`MediaStore::put`].

pub mod adapter;
mod config;
pub mod conduit;
mod error;
mod memory_store;
mod receipt;
mod s3_store;
pub mod store;
mod types;

// Re-export main types for clean API
pub use adapter::MediaAdapter;
pub use conduit::{ConduitEnd, ConduitWriter, DEFAULT_CONDUIT_DEPTH};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult, StatusCode};
pub use memory_store::MemoryStore;
pub use receipt::{DownloadedFile, FileInfo, UploadResult};
pub use s3_store::{S3Config, S3Store, MIN_PART_SIZE};
pub use store::{
    generate_key, public_url, DatedKeyStrategy, GetResult, KeyStrategy, MediaStore, PutResult,
};
pub use types::{
    ByteStream, DownloadFrame, DownloadFrames, FileMetadata, StorageKey, UploadFrame,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DownloadFrame, FileMetadata, MediaAdapter, MediaConfig, MediaError, MediaResult,
        MediaStore, MemoryStore, StatusCode, StorageKey, UploadFrame, UploadResult,
    };
}

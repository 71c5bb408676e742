//! media-axum: RPC surface of the media service over Axum.
//!
//! Unary calls take and return JSON; `UploadStream` and `DownloadStream`
//! exchange newline-delimited JSON frames. Every route lives under
//! [`SERVICE_PATH`].

pub mod app;
pub mod ndjson;
pub mod rpc;
pub mod state;
pub mod wire;
mod error;
pub use error::MediaAxumError;
pub use state::{MediaAxumState, DEFAULT_MAX_FRAME_BYTES};

pub use app::{axum, MediaAxumApp};
pub use rpc::SERVICE_PATH;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use media_blob::MediaError;
use tracing::debug;

use crate::ndjson;
use crate::wire::{
    decode_bytes, DeleteResponse, DownloadResponse, FileInfoResponse, FilePathRequest,
    UploadRequest, UploadResponse, UrlResponse,
};
use crate::{MediaAxumError, MediaAxumState};

/// Prefix shared by every RPC route
pub const SERVICE_PATH: &str = "/media.v1.MediaService";

fn map_json_rejection(rejection: JsonRejection) -> MediaAxumError {
    MediaError::invalid(format!("failed to parse request body: {}", rejection.body_text())).into()
}

async fn upload(
    State(state): State<MediaAxumState>,
    req: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, MediaAxumError> {
    let Json(req) = req.map_err(map_json_rejection)?;
    let content = decode_bytes(&req.content)
        .map_err(|e| MediaError::invalid(format!("content is not valid base64: {e}")))?;

    let receipt = state
        .adapter
        .upload(&req.file_name, content, &req.content_type)
        .await?;
    Ok(Json(receipt.into()))
}

async fn upload_stream(
    State(state): State<MediaAxumState>,
    body: Body,
) -> Result<Json<UploadResponse>, MediaAxumError> {
    let frames = ndjson::upload_frames(body, state.max_frame_bytes);
    let receipt = state.adapter.upload_stream(frames).await?;
    Ok(Json(receipt.into()))
}

async fn download(
    State(state): State<MediaAxumState>,
    req: Result<Json<FilePathRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>, MediaAxumError> {
    let Json(req) = req.map_err(map_json_rejection)?;
    let file = state.adapter.download(&req.file_path).await?;
    Ok(Json(file.into()))
}

async fn download_stream(
    State(state): State<MediaAxumState>,
    req: Result<Json<FilePathRequest>, JsonRejection>,
) -> Result<Response, MediaAxumError> {
    let Json(req) = req.map_err(map_json_rejection)?;
    let frames = state.adapter.download_stream(&req.file_path).await?;
    debug!(file_path = %req.file_path, "Download stream started");
    Ok(ndjson::download_response(frames))
}

async fn delete(
    State(state): State<MediaAxumState>,
    req: Result<Json<FilePathRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, MediaAxumError> {
    let Json(req) = req.map_err(map_json_rejection)?;
    state.adapter.delete(&req.file_path).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    }))
}

async fn get_url(
    State(state): State<MediaAxumState>,
    req: Result<Json<FilePathRequest>, JsonRejection>,
) -> Result<Json<UrlResponse>, MediaAxumError> {
    let Json(req) = req.map_err(map_json_rejection)?;
    Ok(Json(UrlResponse {
        url: state.adapter.url(&req.file_path),
    }))
}

async fn get_file_info(
    State(state): State<MediaAxumState>,
    req: Result<Json<FilePathRequest>, JsonRejection>,
) -> Result<Json<FileInfoResponse>, MediaAxumError> {
    let Json(req) = req.map_err(map_json_rejection)?;
    Ok(Json(state.adapter.file_info(&req.file_path).into()))
}

async fn health() -> &'static str {
    "ok"
}

/// Routes of the media service, relative to [`SERVICE_PATH`]
pub fn service_router(state: MediaAxumState) -> Router<()> {
    let body_limit = state.max_frame_bytes;

    Router::new()
        .route("/Upload", post(upload))
        .route("/UploadStream", post(upload_stream))
        .route("/Download", post(download))
        .route("/DownloadStream", post(download_stream))
        .route("/Delete", post(delete))
        .route("/GetURL", post(get_url))
        .route("/GetFileInfo", post(get_file_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub fn health_router() -> Router<()> {
    Router::new().route("/health", get(health))
}

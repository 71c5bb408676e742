use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use media_blob::MediaError;

use crate::wire::ErrorBody;

/// An RPC failure rendered as `{"code", "message"}` with the matching HTTP status.
#[derive(Debug)]
pub struct MediaAxumError(pub MediaError);

impl From<MediaError> for MediaAxumError {
    fn from(e: MediaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for MediaAxumError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody::from(&self.0))).into_response()
    }
}

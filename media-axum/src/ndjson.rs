//! Newline-delimited JSON framing for the streaming calls.

use std::io;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use media_blob::{DownloadFrames, UploadFrame};
use serde::Serialize;

use crate::wire::{DownloadStreamLine, UploadStreamLine};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Split a byte stream into lines, without their `\n` (or `\r\n`).
///
/// Blank lines are skipped; a line longer than `max_line_bytes` ends the
/// stream with an `InvalidData` error.
pub fn lines<S, E>(body: S, max_line_bytes: usize) -> impl Stream<Item = io::Result<Bytes>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::stream! {
        let mut body = Box::pin(body);
        let mut pending = BytesMut::new();
        // prefix of `pending` already known to hold no newline
        let mut scanned = 0;

        loop {
            while let Some(offset) = pending[scanned..].iter().position(|b| *b == b'\n') {
                let line = trim_line(pending.split_to(scanned + offset + 1).freeze());
                scanned = 0;
                if !line.is_empty() {
                    yield Ok(line);
                }
            }
            scanned = pending.len();
            if pending.len() > max_line_bytes {
                yield Err(too_long(max_line_bytes));
                return;
            }

            match body.next().await {
                Some(Ok(bytes)) => pending.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    yield Err(io::Error::new(io::ErrorKind::Other, err));
                    return;
                }
                None => break,
            }
        }

        let line = trim_line(pending.freeze());
        if !line.is_empty() {
            yield Ok(line);
        }
    }
}

fn trim_line(mut line: Bytes) -> Bytes {
    while matches!(line.last(), Some(b'\n' | b'\r' | b' ' | b'\t')) {
        line.truncate(line.len() - 1);
    }
    line
}

fn too_long(max_line_bytes: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("frame exceeds {max_line_bytes} bytes"),
    )
}

/// Decode an `UploadStream` request body into upload frames
pub fn upload_frames(body: Body, max_line_bytes: usize) -> impl Stream<Item = io::Result<UploadFrame>> + Send {
    lines(body.into_data_stream(), max_line_bytes).map(|line| -> io::Result<UploadFrame> {
        let line: UploadStreamLine = serde_json::from_slice(&line?)?;
        line.into_frame()
            .map_err(|msg| io::Error::new(io::ErrorKind::InvalidData, msg))
    })
}

fn encode_line<T: Serialize>(value: &T) -> io::Result<Bytes> {
    let mut buf = serde_json::to_vec(value)?;
    buf.push(b'\n');
    Ok(Bytes::from(buf))
}

/// Render download frames as an NDJSON response body.
///
/// A failure after the stream started becomes a final `{"error": ...}` line.
pub fn download_response(frames: DownloadFrames) -> Response {
    let body = frames.map(|item| match item {
        Ok(frame) => encode_line(&DownloadStreamLine::from(frame)),
        Err(err) => encode_line(&DownloadStreamLine::from(&err)),
    });

    ([(CONTENT_TYPE, NDJSON_CONTENT_TYPE)], Body::from_stream(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
        let parts: Vec<Result<Bytes, io::Error>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        futures::stream::iter(parts)
    }

    async fn collect(parts: &[&'static str], max: usize) -> Vec<io::Result<Bytes>> {
        lines(chunks(parts), max).collect().await
    }

    #[tokio::test]
    async fn lines_split_across_reads() {
        let out = collect(&["{\"a\":", "1}\n{\"b\"", ":2}\r\n\n{\"c\":3}"], 1024).await;
        let out: Vec<Bytes> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            out,
            vec![
                Bytes::from_static(b"{\"a\":1}"),
                Bytes::from_static(b"{\"b\":2}"),
                Bytes::from_static(b"{\"c\":3}"),
            ]
        );
    }

    #[tokio::test]
    async fn long_line_in_small_reads_stays_linear() {
        let mut line = vec![b'a'; 8 * 1024 * 1024];
        line.push(b'\n');
        let line = Bytes::from(line);
        let reads: Vec<Result<Bytes, io::Error>> = (0..line.len())
            .step_by(8 * 1024)
            .map(|start| Ok(line.slice(start..(start + 8 * 1024).min(line.len()))))
            .collect();

        let started = std::time::Instant::now();
        let out: Vec<io::Result<Bytes>> =
            lines(futures::stream::iter(reads), 16 * 1024 * 1024).collect().await;
        let elapsed = started.elapsed();

        assert!(elapsed < std::time::Duration::from_secs(5), "took {elapsed:?}");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap().len(), 8 * 1024 * 1024);
    }

    #[tokio::test]
    async fn overlong_line_is_an_error() {
        let out = collect(&["{\"chunk\":\"", "aaaaaaaaaaaaaaaaaaaa"], 16).await;
        let err = out.last().unwrap().as_ref().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn malformed_line_is_a_receive_error() {
        let body = Body::from("{\"metadata\":{\"fileName\":\"a.txt\"}}\nnot json\n");
        let frames: Vec<io::Result<UploadFrame>> = upload_frames(body, 1024).collect().await;
        assert!(matches!(frames[0], Ok(UploadFrame::Metadata(_))));
        assert_eq!(frames[1].as_ref().unwrap_err().kind(), io::ErrorKind::InvalidData);
    }
}

//! In-process byte conduit between a frame receiver and a storage write.
//!
//! The writer half is fed by the transport; the reader half is a
//! [`ByteStream`] handed to [`MediaStore::put`](crate::MediaStore::put).
//! The channel is bounded, so a slow consumer suspends the writer instead of
//! buffering the whole upload.

use bytes::Bytes;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ByteStream;

/// Default number of in-flight segments
pub const DEFAULT_CONDUIT_DEPTH: usize = 1;

#[derive(Debug)]
enum Segment {
    Data(Bytes),
    End,
    Failed(io::Error),
}

/// Create a conduit holding at most `depth` segments in flight.
///
/// The reader only ends cleanly after [`ConduitWriter::close`]. A writer that
/// is dropped without closing surfaces as an `UnexpectedEof` error, so an
/// abandoned upload can never be committed as complete.
pub fn conduit(depth: usize) -> (ConduitWriter, ByteStream) {
    let (tx, mut rx) = mpsc::channel(depth.max(1));
    let reached = Arc::new(AtomicBool::new(false));

    let end = Arc::clone(&reached);
    let reader = async_stream::stream! {
        loop {
            match rx.recv().await {
                Some(Segment::Data(bytes)) => yield Ok(bytes),
                Some(Segment::End) => {
                    end.store(true, Ordering::Release);
                    break;
                }
                Some(Segment::Failed(err)) => {
                    yield Err(err);
                    break;
                }
                None => {
                    yield Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "conduit writer dropped before end of stream",
                    ));
                    break;
                }
            }
        }
    };

    (ConduitWriter { tx, written: 0, reached }, Box::pin(reader))
}

/// Handle returned by [`ConduitWriter::close`] to check the reader got to the end
#[derive(Debug, Clone)]
pub struct ConduitEnd {
    reached: Arc<AtomicBool>,
}

impl ConduitEnd {
    /// Whether the reader consumed the end of stream marker.
    ///
    /// Only meaningful once the consumer has finished with the reader.
    pub fn reached(&self) -> bool {
        self.reached.load(Ordering::Acquire)
    }
}

/// Producer half of a conduit.
#[derive(Debug)]
pub struct ConduitWriter {
    tx: mpsc::Sender<Segment>,
    written: u64,
    reached: Arc<AtomicBool>,
}

impl ConduitWriter {
    /// Write one segment, waiting while the reader is behind.
    ///
    /// Fails with `BrokenPipe` once the reader has been dropped.
    pub async fn write(&mut self, chunk: Bytes) -> io::Result<usize> {
        let len = chunk.len();
        self.send(Segment::Data(chunk)).await?;
        self.written += len as u64;
        Ok(len)
    }

    /// Total bytes accepted so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Signal a clean end of stream.
    ///
    /// Fails with `BrokenPipe` when the reader is already gone. Success only
    /// means the marker was queued; see [`ConduitEnd::reached`].
    pub async fn close(mut self) -> io::Result<ConduitEnd> {
        self.send(Segment::End).await?;
        Ok(ConduitEnd {
            reached: self.reached,
        })
    }

    /// End the stream with `err`; the reader observes it as its final item.
    pub async fn close_with_error(mut self, err: io::Error) {
        let _ = self.send(Segment::Failed(err)).await;
    }

    async fn send(&mut self, segment: Segment) -> io::Result<()> {
        self.tx
            .send(segment)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "conduit reader closed"))
    }
}

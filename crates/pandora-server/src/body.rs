//! Streaming response bodies.
//!
//! An export writes into one end of a bounded in-memory pipe while hyper
//! drains the other end into the HTTP response. The pipe capacity is the
//! backpressure bound: when the client reads slowly the export task blocks
//! on its next write instead of buffering ahead. When the client goes away
//! hyper drops the body, the pipe's read half closes, and the export task's
//! next write fails with a broken pipe.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Frame};
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};

/// Body type shared by every response the server produces.
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Read chunk size for draining the pipe into response frames.
const READ_CHUNK: usize = 16 * 1024;

/// A complete in-memory body (error envelopes, health payloads).
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(io::Error::other).boxed()
}

/// Response body streaming from the write half of an in-memory pipe.
pub struct StreamingBody {
    reader: DuplexStream,
    buf: BytesMut,
}

impl StreamingBody {
    /// Create a pipe of `capacity` bytes; returns the write half for the
    /// export task and the body for the response.
    #[must_use]
    pub fn pipe(capacity: usize) -> (DuplexStream, Self) {
        let (writer, reader) = tokio::io::duplex(capacity);
        (
            writer,
            Self {
                reader,
                buf: BytesMut::zeroed(READ_CHUNK),
            },
        )
    }

    /// Box the body into [`ResponseBody`].
    #[must_use]
    pub fn boxed(self) -> ResponseBody {
        BodyExt::boxed(self)
    }
}

impl Body for StreamingBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let mut read_buf = ReadBuf::new(&mut this.buf);

        match Pin::new(&mut this.reader).poll_read(cx, &mut read_buf) {
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    // Write half dropped or shut down: end of body.
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Frame::data(Bytes::copy_from_slice(filled)))))
                }
            }
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncWriteExt;

    async fn collect(body: StreamingBody) -> Vec<u8> {
        let collected = BodyExt::collect(body).await.unwrap();
        collected.to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_pipe_carries_bytes() {
        let (mut writer, body) = StreamingBody::pipe(1024);

        tokio::spawn(async move {
            writer.write_all(b"hello ").await.unwrap();
            writer.write_all(b"stream").await.unwrap();
            writer.shutdown().await.unwrap();
        });

        assert_eq!(collect(body).await, b"hello stream");
    }

    #[tokio::test]
    async fn test_dropped_writer_ends_body() {
        let (writer, body) = StreamingBody::pipe(1024);
        drop(writer);
        assert!(collect(body).await.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_reader_fails_writer() {
        let (mut writer, body) = StreamingBody::pipe(16);
        drop(body);

        // The pipe is tiny, so a large write must hit the closed read half.
        let err = writer.write_all(&[0u8; 1024]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_small_pipe_still_moves_everything() {
        let payload = vec![42u8; 100_000];
        let (mut writer, body) = StreamingBody::pipe(64);

        let expected = payload.clone();
        tokio::spawn(async move {
            writer.write_all(&payload).await.unwrap();
            writer.shutdown().await.unwrap();
        });

        assert_eq!(collect(body).await, expected);
    }

    #[tokio::test]
    async fn test_full_body() {
        let body = full("payload");
        let collected = BodyExt::collect(body).await.unwrap();
        assert_eq!(collected.to_bytes().as_ref(), b"payload");
    }
}

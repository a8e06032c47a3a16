use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;

use crate::{ChatRequest, TransportError};

/// A chunked response body of a chat stream.
pub trait ChunkStream: Send + 'static {
    /// Attempts to pull out the next chunk of the body.
    ///
    /// # Return value
    ///
    /// - `Poll::Pending` means that the next chunk is not available yet.
    ///   Implementations will ensure that the current task will be
    ///   notified when it may be ready.
    /// - `Poll::Ready(Ok(Some(chunk)))` means a chunk was read, and more
    ///   may follow on subsequent calls.
    /// - `Poll::Ready(Ok(None))` means the body has been fully read.
    /// - `Poll::Ready(Err(error))` means reading the body failed.
    ///
    /// Chunk boundaries are arbitrary, they don't have to line up with
    /// event frames or even UTF-8 characters. Calling this method after
    /// completion should always return `None`.
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, TransportError>>;
}

impl ChunkStream for Pin<Box<dyn ChunkStream>> {
    #[inline]
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, TransportError>> {
        self.get_mut().as_mut().poll_next_chunk(cx)
    }
}

/// A type that opens chat streams against the backend.
///
/// Building the request (URL, headers, credentials, correlation ids) is
/// entirely the transport's business. Once created, a transport should
/// behave like a stateless object.
pub trait ChatTransport: Send + Sync {
    /// The response body type of this transport.
    type Body: ChunkStream;

    /// Sends a chat request and resolves to the streaming response body.
    fn open_stream(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Body, TransportError>> + Send + 'static;
}

use std::fmt::{self, Debug};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use medimg_chat_model::{ChunkStream, ErrorKind, TransportError};
use pin_project_lite::pin_project;
use reqwest::Response;

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextChunk = (reqwest::Result<Option<Bytes>>, Response);

pin_project! {
    /// The streaming body of a chat response.
    ///
    /// The in-flight read is stored in the body itself, so a caller can
    /// stop polling at any time without losing a chunk.
    pub struct HttpBody {
        next_chunk_fut: Option<PinnedFuture<NextChunk>>,
        response: Option<Response>,
    }
}

impl HttpBody {
    #[inline]
    pub(crate) fn from_response(response: Response) -> Self {
        Self {
            next_chunk_fut: None,
            response: Some(response),
        }
    }
}

impl Debug for HttpBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBody")
            .field("reading", &self.next_chunk_fut.is_some())
            .finish_non_exhaustive()
    }
}

impl ChunkStream for HttpBody {
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, TransportError>> {
        let this = self.project();
        if this.next_chunk_fut.is_none() {
            let Some(mut response) = this.response.take() else {
                // The body has been exhausted or failed.
                return Poll::Ready(Ok(None));
            };
            let next_chunk_fut = async move {
                let chunk = response.chunk().await;
                (chunk, response)
            };
            *this.next_chunk_fut = Some(Box::pin(next_chunk_fut));
        }
        let Some(next_chunk_fut) = this.next_chunk_fut.as_mut() else {
            return Poll::Ready(Ok(None));
        };

        let (chunk, response) = ready!(next_chunk_fut.as_mut().poll(cx));
        *this.next_chunk_fut = None;
        match chunk {
            Ok(Some(bytes)) => {
                *this.response = Some(response);
                Poll::Ready(Ok(Some(bytes)))
            }
            Ok(None) => Poll::Ready(Ok(None)),
            Err(err) => {
                error!("failed to read the response body: {err}");
                Poll::Ready(Err(TransportError::new(
                    ErrorKind::Body,
                    format!("{err}"),
                )))
            }
        }
    }
}

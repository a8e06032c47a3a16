use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;

use medimg_chat_model::{
    ChatRequest, ChatTransport, ChunkStream, TransportError,
};
use tracing::Instrument;

/// A type-erased response body.
pub type BoxChunkStream = Pin<Box<dyn ChunkStream>>;

type OpenStreamResult = Result<BoxChunkStream, TransportError>;
type BoxedOpenStreamFuture =
    Pin<Box<dyn Future<Output = OpenStreamResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ChatRequest) -> BoxedOpenStreamFuture + Send + Sync>;

/// A wrapper around a chat transport that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ChatClient {
    handler_fn: HandlerFn,
}

impl ChatClient {
    /// Creates a client that opens streams with `transport`.
    #[inline]
    pub fn new<T: ChatTransport + 'static>(transport: T) -> Self {
        // We have to erase the type `T`, since `ChatClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = transport.open_stream(&req);
            Box::pin(
                async move {
                    trace!("opening a stream for: {req:?}");
                    let body = fut.await.inspect_err(|err| {
                        error!("failed to open the stream: {err}");
                    })?;
                    Ok(Box::pin(body) as BoxChunkStream)
                }
                .instrument(trace_span!("chat client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the streaming response body.
    #[inline]
    pub async fn open_stream(&self, req: ChatRequest) -> OpenStreamResult {
        (self.handler_fn)(req).await
    }
}

impl Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use medimg_chat_model::{ErrorKind, StreamEvent, Transcript};
    use medimg_chat_stream::Turn;
    use medimg_chat_test_transport::{PresetResponse, TestTransport};

    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            message: "Hi".to_owned(),
            history: vec![],
        }
    }

    #[tokio::test]
    async fn test_open_stream() {
        let transport = TestTransport::default();
        for _ in 0..3 {
            transport.add_response(PresetResponse::with_events([
                StreamEvent::Content {
                    content: "How ".to_owned(),
                },
                StreamEvent::Content {
                    content: "are you?".to_owned(),
                },
                StreamEvent::Done,
            ]));
        }

        let client = ChatClient::new(transport.clone());
        for _ in 0..3 {
            let body = client.open_stream(request()).await.unwrap();
            let (transcript, result) =
                Turn::new(Transcript::new(), body).run(|_| {}).await;
            assert!(result.is_ok());
            assert_eq!(transcript.last().unwrap().content, "How are you?");
        }
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let client = ChatClient::new(TestTransport::default());
        let result = client.open_stream(request()).await;
        assert_eq!(result.err().map(|err| err.kind()), Some(ErrorKind::Other));
    }
}

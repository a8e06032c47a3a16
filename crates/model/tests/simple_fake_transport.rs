use std::collections::VecDeque;
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll};

use bytes::Bytes;
use medimg_chat_model::{
    ChatRequest, ChatTransport, ChunkStream, ErrorKind, StreamEvent,
    TransportError,
};

#[derive(Debug)]
struct FakeBody {
    fake_chunks: VecDeque<Bytes>,
}

impl FakeBody {
    fn new(input: &str) -> Self {
        let fake_chunks = format!("You said {input}")
            .split(' ')
            .map(|word| {
                let event = StreamEvent::Content {
                    content: format!("{word} "),
                };
                let payload = serde_json::to_string(&event).unwrap();
                Bytes::from(format!("data: {payload}\n\n"))
            })
            .collect();
        Self { fake_chunks }
    }
}

impl ChunkStream for FakeBody {
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<Bytes>, TransportError>> {
        Poll::Ready(Ok(self.get_mut().fake_chunks.pop_front()))
    }
}

struct FakeTransport;

impl ChatTransport for FakeTransport {
    type Body = FakeBody;

    fn open_stream(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Body, TransportError>> + Send + 'static
    {
        let result = if req.message.is_empty() {
            Err(TransportError::status(400, "Message is required"))
        } else {
            Ok(FakeBody::new(&req.message))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_stream_body() {
        let transport = FakeTransport;
        let req = ChatRequest {
            message: "Good morning".to_owned(),
            history: vec![],
        };
        let mut body = transport.open_stream(&req).await.unwrap();

        let mut raw = String::new();
        loop {
            let chunk_fut =
                poll_fn(|cx| Pin::new(&mut body).poll_next_chunk(cx));
            match chunk_fut.await {
                Ok(Some(chunk)) => {
                    raw.push_str(std::str::from_utf8(&chunk).unwrap());
                }
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        let content: String = raw
            .split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .map(|payload| match StreamEvent::from_payload(payload) {
                Ok(StreamEvent::Content { content }) => content,
                other => unreachable!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(content, "You said Good morning ");
    }

    #[tokio::test]
    async fn test_error() {
        let transport = FakeTransport;
        let req = ChatRequest {
            message: String::new(),
            history: vec![],
        };
        let err = transport.open_stream(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status_code(), Some(400));
    }
}

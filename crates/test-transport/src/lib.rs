//! A scripted in-memory transport for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bytes::Bytes;
use medimg_chat_model::{
    ChatRequest, ChatTransport, ChunkStream, ErrorKind, TransportError,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

/// The body of a preset response.
pub struct TestBody {
    chunks: VecDeque<PresetChunk>,
    delay: Option<Duration>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ChunkStream for TestBody {
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, TransportError>> {
        let this = self.get_mut();
        if let Some(delay) = this.delay {
            let sleep =
                this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
        }

        match this.chunks.pop_front() {
            Some(PresetChunk::Bytes(bytes)) => {
                Poll::Ready(Ok(Some(Bytes::from(bytes))))
            }
            Some(PresetChunk::Fail(message)) => {
                Poll::Ready(Err(TransportError::new(ErrorKind::Body, message)))
            }
            Some(PresetChunk::Stall) => {
                // Never wakes the task, the caller has to give up on us.
                this.chunks.push_front(PresetChunk::Stall);
                Poll::Pending
            }
            None => Poll::Ready(Ok(None)),
        }
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ChatRequest>,
}

/// A local fake chat backend for testing purpose.
///
/// Before sending requests, you need to queue the responses the backend
/// should stream. Each request takes the next queued response, if there
/// are no responses left, opening the stream fails.
///
/// Clones share the same script, so a test can keep a clone to inspect
/// the received requests after handing the transport over.
#[derive(Clone, Default)]
pub struct TestTransport {
    script: Arc<Mutex<Script>>,
}

impl TestTransport {
    /// Queues a response for the next request.
    #[inline]
    pub fn add_response(&self, preset: PresetResponse) {
        self.script().responses.push_back(preset);
    }

    /// Returns all requests received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.script().requests.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatTransport for TestTransport {
    type Body = TestBody;

    fn open_stream(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Body, TransportError>> + Send + 'static
    {
        let mut script = self.script();
        script.requests.push(req.clone());
        let result = match script.responses.pop_front() {
            None => Err(TransportError::new(
                ErrorKind::Other,
                "no more preset responses",
            )),
            Some(PresetResponse {
                rejection: Some(status),
                ..
            }) => Err(TransportError::status(status, "rejected by preset")),
            Some(preset) => Ok(TestBody {
                chunks: preset.chunks.into(),
                delay: preset.delay,
                sleep: None,
            }),
        };
        ready(result)
    }
}

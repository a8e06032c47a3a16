use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use medimg_chat_model::{ChunkStream, TransportError};

/// An in-memory chunk source.
pub struct Chunks {
    items: VecDeque<Result<Bytes, TransportError>>,
}

impl Chunks {
    pub fn from_vec_deque(vec: VecDeque<Bytes>) -> Self {
        Self {
            items: vec.into_iter().map(Ok).collect(),
        }
    }

    /// Creates a chunk source that fails with `err` after all `vec` items
    /// are delivered.
    pub fn failing_after(vec: VecDeque<Bytes>, err: TransportError) -> Self {
        let mut chunks = Self::from_vec_deque(vec);
        chunks.items.push_back(Err(err));
        chunks
    }

    pub fn from_static(items: &[&'static [u8]]) -> Self {
        Self::from_vec_deque(
            items.iter().copied().map(Bytes::from_static).collect(),
        )
    }
}

impl ChunkStream for Chunks {
    #[inline]
    fn poll_next_chunk(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<Bytes>, TransportError>> {
        Poll::Ready(self.get_mut().items.pop_front().transpose())
    }
}

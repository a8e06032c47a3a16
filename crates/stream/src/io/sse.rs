use std::future::poll_fn;
use std::mem;
use std::pin::Pin;

use medimg_chat_model::{ChunkStream, TransportError};

use super::Utf8Decoder;

const FRAME_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data: ";

/// One complete event block of the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    /// Returns the payloads of all `data:` lines in this frame.
    ///
    /// Lines are `field: value` pairs, other fields and comments are
    /// skipped.
    pub fn data(&self) -> impl Iterator<Item = &str> {
        self.0
            .lines()
            .filter_map(|line| line.strip_prefix(DATA_PREFIX))
    }

    /// Returns the raw text of this frame, without its delimiter.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A type for reading server-sent event frames from a chunk stream.
pub struct Sse<S> {
    body: Pin<Box<S>>,
    decoder: Utf8Decoder,
    buf: String,
    // Offset in `buf` from which no delimiter has been seen yet.
    scan_from: usize,
    eof: bool,
}

impl<S: ChunkStream> Sse<S> {
    /// Creates a reader over the given body.
    #[inline]
    pub fn new(body: S) -> Self {
        Self {
            body: Box::pin(body),
            decoder: Utf8Decoder::new(),
            buf: String::new(),
            scan_from: 0,
            eof: false,
        }
    }

    /// Reads the next complete frame.
    ///
    /// Returns `Ok(None)` after the body has ended and all frames are
    /// consumed. Text left in the buffer at the end of the body is
    /// yielded as one last frame, even without a closing blank line.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The buffer is only modified after a
    /// chunk has been read, so no data is lost if the future is dropped.
    pub async fn next_frame(
        &mut self,
    ) -> Result<Option<Frame>, TransportError> {
        loop {
            // There may be complete frames buffered from a previous read.
            if let Some(frame) = self.try_parse_frame() {
                return Ok(Some(frame));
            }

            if self.eof {
                return Ok(self.take_remainder());
            }

            let chunk =
                poll_fn(|cx| self.body.as_mut().poll_next_chunk(cx)).await?;
            match chunk {
                Some(bytes) => {
                    trace!("got a chunk of {} bytes", bytes.len());
                    let text = self.decoder.decode(&bytes);
                    self.buf.push_str(&text);
                }
                None => {
                    trace!("reached the end of the body");
                    let tail = self.decoder.finish();
                    self.buf.push_str(&tail);
                    self.eof = true;
                }
            }
        }
    }

    fn try_parse_frame(&mut self) -> Option<Frame> {
        // For `end-of-line`, we only handle line feed.
        //
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / cr / lf )
        let unscanned = &self.buf[self.scan_from..];
        let Some(idx) = unscanned.find(FRAME_DELIMITER) else {
            // Keep the last byte, it may be the first half of a delimiter.
            self.scan_from = self.buf.len().saturating_sub(1);
            while !self.buf.is_char_boundary(self.scan_from) {
                self.scan_from -= 1;
            }
            return None;
        };
        let eol_idx = self.scan_from + idx;

        let frame = Frame(self.buf[..eol_idx].to_owned());
        self.buf.drain(..eol_idx + FRAME_DELIMITER.len());
        self.scan_from = 0;

        Some(frame)
    }

    fn take_remainder(&mut self) -> Option<Frame> {
        self.scan_from = 0;
        let remainder = mem::take(&mut self.buf);
        if remainder.trim().is_empty() {
            return None;
        }
        debug!("flushing an unterminated frame at the end of the body");
        Some(Frame(remainder))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use medimg_chat_model::ErrorKind;

    use super::*;
    use crate::io::Chunks;

    async fn collect_data(sse: &mut Sse<Chunks>) -> Vec<String> {
        let mut data = vec![];
        while let Some(frame) = sse.next_frame().await.unwrap() {
            data.extend(frame.data().map(ToOwned::to_owned));
        }
        data
    }

    #[tokio::test]
    async fn test_normal_events() {
        let chunks =
            Chunks::from_static(&[b"data: hello\n\n", b"data: bye\n\n"]);
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["hello", "bye"]);
        assert_eq!(sse.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_many_frames_in_one_chunk() {
        let chunks =
            Chunks::from_static(&[b"data: 1\n\ndata: 2\n\ndata: 3\n\n"]);
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let chunks = Chunks::from_static(&[
            b"data:",
            b" hello\n",
            b"\n",
            b"data: bye\n",
            b"\ndata: again",
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["hello", "bye", "again"]);
    }

    #[tokio::test]
    async fn test_partial_frame_is_buffered() {
        let chunks = Chunks::from_static(&[b"data: hel", b"lo\n\n"]);
        let mut sse = Sse::new(chunks);
        let frame = sse.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.as_str(), "data: hello");
        assert_eq!(sse.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_other_fields() {
        let chunks = Chunks::from_static(&[
            b": keep-alive\nevent: message\ndata: one\ndata: two\nid: 7\n\n",
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["one", "two"]);
    }

    #[tokio::test]
    async fn test_unterminated_remainder() {
        let chunks = Chunks::from_static(&[b"data: hello\n\ndata: tail\n"]);
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["hello", "tail"]);

        let chunks = Chunks::from_static(&[b"data: hello\n\n\n"]);
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["hello"]);
    }

    #[tokio::test]
    async fn test_multibyte_across_chunks() {
        let bytes = "data: 🩻\n\n".as_bytes();
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::copy_from_slice(&bytes[..8]),
                Bytes::copy_from_slice(&bytes[8..]),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(collect_data(&mut sse).await, ["🩻"]);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let chunks = Chunks::failing_after(
            vec![Bytes::from_static(b"data: hello\n\ndata: cut")].into(),
            TransportError::new(ErrorKind::Body, "connection reset"),
        );
        let mut sse = Sse::new(chunks);
        let frame = sse.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.data().collect::<Vec<_>>(), ["hello"]);
        let err = sse.next_frame().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Body);
    }
}

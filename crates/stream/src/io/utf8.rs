use std::mem;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// A stateful UTF-8 decoder for chunked input.
///
/// A multi-byte sequence cut by a chunk boundary is held back until the
/// next chunk completes it. Invalid sequences decode to U+FFFD.
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates a decoder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next chunk, returning all complete characters.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let joined;
        let input = if self.pending.is_empty() {
            bytes
        } else {
            let mut pending = mem::take(&mut self.pending);
            pending.extend_from_slice(bytes);
            joined = pending;
            &joined[..]
        };

        let mut decoded = String::with_capacity(input.len());
        let mut chunks = input.utf8_chunks().peekable();
        while let Some(chunk) = chunks.next() {
            decoded.push_str(chunk.valid());
            let invalid = chunk.invalid();
            if invalid.is_empty() {
                continue;
            }
            if chunks.peek().is_none() && is_incomplete(invalid) {
                // Wait for the rest of the sequence.
                self.pending.extend_from_slice(invalid);
            } else {
                decoded.push(REPLACEMENT);
            }
        }
        decoded
    }

    /// Flushes the decoder at the end of input.
    ///
    /// A dangling incomplete sequence decodes to a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        REPLACEMENT.to_string()
    }

    /// Returns `true` if there are bytes waiting for the next chunk.
    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Returns `true` if `bytes` is the start of a valid sequence that is cut
/// short.
#[inline]
fn is_incomplete(bytes: &[u8]) -> bool {
    str::from_utf8(bytes).is_err_and(|err| err.error_len().is_none())
}

#[cfg(test)]
mod chunks;
mod sse;
mod utf8;

#[cfg(test)]
pub(crate) use chunks::Chunks;
pub use sse::{Frame, Sse};
pub use utf8::Utf8Decoder;

//! Incremental assembly of the chat transcript from a server-sent event
//! stream.
//!
//! The pipeline has three stages:
//!
//! 1. [`Utf8Decoder`] decodes body chunks statefully, so characters split
//!    across chunk boundaries survive intact.
//! 2. [`Sse`] buffers the decoded text and cuts it into [`Frame`]s on
//!    blank lines.
//! 3. [`TranscriptReducer`] folds the `data:` payloads of every frame into
//!    the transcript, producing a new snapshot per mutation.
//!
//! [`Turn`] strings the stages together for one assistant turn.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod io;
pub mod reducer;
mod turn;

pub use io::{Frame, Sse, Utf8Decoder};
pub use reducer::{Applied, TranscriptReducer, TurnState};
pub use turn::{Turn, TurnUpdate};

//! Chat session logic: turn lifecycle, fallback messages, timeouts and
//! user-initiated stops on top of the stream reducer.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chat_client;
mod session;

pub use chat_client::{BoxChunkStream, ChatClient};
pub use session::{
    ChatSession, ChatSessionBuilder, DEFAULT_FALLBACK_MESSAGE,
    DEFAULT_TIMEOUT_MESSAGE, DEFAULT_TURN_TIMEOUT, SessionError, SessionEvent,
    StopHandle, TurnEnd, TurnReport,
};

use serde::{Deserialize, Serialize};

use crate::Role;

/// The payload posted to the chat stream endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user message.
    pub message: String,
    /// Prior messages of the conversation, oldest first.
    pub history: Vec<HistoryEntry>,
}

/// A prior message as replayed upstream.
///
/// Only the role and the text are replayed, tool calls and tool outputs
/// stay on the client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author of the message.
    pub role: Role,
    /// Text of the message.
    pub content: String,
}

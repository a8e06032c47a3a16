use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A payload carried by one `data:` line of the chat stream.
///
/// The payload is a JSON object tagged by its `type` field. Types this
/// client doesn't know about deserialize to [`StreamEvent::Unknown`], so
/// that newer servers can add events without breaking older clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A piece of free text to append to the open message.
    Content {
        /// The text delta.
        content: String,
    },
    /// The model invoked a tool.
    ToolCall {
        /// Name of the tool.
        name: String,
        /// Arguments of the call. Expected to be an object.
        #[serde(default)]
        args: Value,
    },
    /// A tool returned its output.
    ToolOutput {
        /// Name of the tool.
        name: String,
        /// The output payload.
        #[serde(default)]
        output: Value,
    },
    /// The assistant has finished its response.
    Done,
    /// The server reported an error. The turn may still continue.
    Error {
        /// A human-readable error message.
        #[serde(default)]
        message: String,
    },
    /// An event type this client doesn't recognize.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Parses an event from the payload of a `data:` line.
    #[inline]
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

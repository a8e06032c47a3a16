use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message typed by the user.
    User,
    /// A message produced by the assistant.
    Assistant,
}

/// A request the backend's language model emitted to invoke a named
/// capability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the invoked tool.
    pub name: String,
    /// The argument pairs passed to the tool.
    pub args: Map<String, Value>,
}

/// The result returned for a prior [`ToolCall`].
///
/// Outputs are correlated with calls by order and name only, there is no
/// correlation id on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Name of the tool that produced this output.
    pub name: String,
    /// The raw output payload.
    pub output: Value,
}

/// A message in the chat transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: Role,
    /// Free text of the message.
    pub content: String,
    /// Tool calls announced while this message was streaming.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Tool outputs received while this message was streaming.
    #[serde(default)]
    pub tool_outputs: Vec<ToolOutput>,
}

impl ChatMessage {
    /// Creates a complete user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Creates an assistant message with the given content.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    #[inline]
    fn with_role<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: vec![],
            tool_outputs: vec![],
        }
    }
}

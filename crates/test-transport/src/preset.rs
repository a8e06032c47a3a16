use std::time::Duration;

use medimg_chat_model::StreamEvent;
use serde::{Deserialize, Serialize};

/// A chunk in a preset response body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetChunk {
    /// Raw body bytes, not necessarily aligned to frames or characters.
    #[serde(rename = "bytes")]
    Bytes(Vec<u8>),
    /// Reading the body fails with the given message.
    #[serde(rename = "fail")]
    Fail(String),
    /// The body stops producing data without ending.
    #[serde(rename = "stall")]
    Stall,
}

/// The preset response for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Chunks of the body.
    pub chunks: Vec<PresetChunk>,
    /// If set, opening the stream fails with this HTTP status.
    pub rejection: Option<u16>,
    /// Delay before each chunk is delivered.
    pub delay: Option<Duration>,
}

impl PresetResponse {
    /// Creates a response that sends each event as its own chunk.
    pub fn with_events(events: impl IntoIterator<Item = StreamEvent>) -> Self {
        let chunks: Vec<_> = events
            .into_iter()
            .map(|event| PresetChunk::Bytes(encode_frame(&event).into_bytes()))
            .collect();
        Self::with_chunks(chunks)
    }

    /// Creates a response with the given body chunks.
    #[inline]
    pub fn with_chunks(chunks: impl Into<Vec<PresetChunk>>) -> Self {
        Self {
            chunks: chunks.into(),
            ..Default::default()
        }
    }

    /// Creates a response whose request is rejected with `status`.
    #[inline]
    pub fn rejected(status: u16) -> Self {
        Self {
            rejection: Some(status),
            ..Default::default()
        }
    }

    /// Appends a body read failure after the current chunks.
    #[inline]
    pub fn then_fail<S: Into<String>>(mut self, message: S) -> Self {
        self.chunks.push(PresetChunk::Fail(message.into()));
        self
    }

    /// Appends a stall after the current chunks.
    #[inline]
    pub fn then_stall(mut self) -> Self {
        self.chunks.push(PresetChunk::Stall);
        self
    }

    /// Sets the delay before each chunk.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Encodes an event as one complete `data:` frame.
pub fn encode_frame(event: &StreamEvent) -> String {
    // Serializing these plain enums can't fail.
    let payload = serde_json::to_string(event).unwrap_or_default();
    format!("data: {payload}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            StreamEvent::Content {
                content: "Let me check.".to_owned(),
            },
            StreamEvent::Done,
        ])
        .then_fail("connection reset")
        .with_delay(Duration::from_millis(5));

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_with_events() {
        let response = PresetResponse::with_events([
            StreamEvent::Content {
                content: "Hi".to_owned(),
            },
            StreamEvent::Done,
        ]);
        assert_eq!(
            response.chunks,
            [
                PresetChunk::Bytes(
                    b"data: {\"type\":\"content\",\"content\":\"Hi\"}\n\n"
                        .to_vec()
                ),
                PresetChunk::Bytes(b"data: {\"type\":\"done\"}\n\n".to_vec()),
            ]
        );
        assert_eq!(response.rejection, None);
    }

    #[test]
    fn test_encode_frame() {
        assert_eq!(
            encode_frame(&StreamEvent::Content {
                content: "Hi".to_owned()
            }),
            "data: {\"type\":\"content\",\"content\":\"Hi\"}\n\n"
        );
    }
}

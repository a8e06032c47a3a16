//! The transcript reducer state machine.
//!
//! A reducer is created per assistant turn, on top of the transcript the
//! turn starts from. It owns all transcript mutation for the duration of
//! the turn, and hands out a fresh [`Transcript`] snapshot for every event
//! that changes it.

use medimg_chat_model::{
    ChatMessage, StreamEvent, ToolCall, ToolOutput, Transcript,
};
use serde_json::{Map, Value};

/// The lifecycle of one assistant turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Nothing has been read yet.
    #[default]
    Idle,
    /// Frames are being applied.
    Streaming,
    /// The response has finished, either by a `done` event or by the end
    /// of the stream.
    Sealed,
    /// The transport failed. Nothing will be applied anymore.
    Failed,
}

impl TurnState {
    /// Returns `true` if the turn has ended.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Sealed | TurnState::Failed)
    }
}

/// The result of applying an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The transcript changed, this is the new snapshot.
    Updated(Transcript),
    /// The open message has been sealed.
    Sealed,
    /// The server reported an error. The transcript is unchanged.
    Notice(String),
    /// The event has no effect.
    Ignored,
}

/// Folds stream events into a transcript.
#[derive(Clone, Debug)]
pub struct TranscriptReducer {
    transcript: Transcript,
    state: TurnState,
    // Index of the assistant message currently receiving events.
    open_idx: Option<usize>,
}

impl TranscriptReducer {
    /// Creates a reducer for a new turn on top of `transcript`.
    #[inline]
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            state: TurnState::Idle,
            open_idx: None,
        }
    }

    /// Returns the latest snapshot.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the current turn state.
    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Consumes the reducer and returns the latest snapshot.
    #[inline]
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Marks the turn as streaming once the first frame has arrived.
    #[inline]
    pub fn begin(&mut self) {
        if self.state == TurnState::Idle {
            self.state = TurnState::Streaming;
        }
    }

    /// Parses and applies the payload of one `data:` line.
    ///
    /// A payload that fails to parse is logged and skipped.
    pub fn apply_payload(&mut self, payload: &str) -> Applied {
        match StreamEvent::from_payload(payload) {
            Ok(event) => self.apply(event),
            Err(err) => {
                warn!("skipping malformed event: {err}");
                trace!("malformed payload: {payload}");
                Applied::Ignored
            }
        }
    }

    /// Applies one event.
    pub fn apply(&mut self, event: StreamEvent) -> Applied {
        if self.state == TurnState::Failed {
            trace!("turn has failed, dropping event: {event:?}");
            return Applied::Ignored;
        }
        trace!("applying event: {event:?}");

        match event {
            StreamEvent::Content { content } => {
                self.update_open(|msg| msg.content.push_str(&content))
            }
            StreamEvent::ToolCall { name, args } => {
                let args = object_or_empty(&name, args);
                self.update_open(|msg| {
                    msg.tool_calls.push(ToolCall { name, args })
                })
            }
            StreamEvent::ToolOutput { name, output } => {
                self.update_open(|msg| {
                    msg.tool_outputs.push(ToolOutput { name, output })
                })
            }
            StreamEvent::Done => {
                self.seal();
                Applied::Sealed
            }
            StreamEvent::Error { message } => {
                warn!("server reported an error: {message}");
                Applied::Notice(message)
            }
            StreamEvent::Unknown => Applied::Ignored,
        }
    }

    /// Seals the turn at the end of the stream.
    #[inline]
    pub fn finish(&mut self) {
        if !self.state.is_terminal() {
            self.seal();
        }
    }

    /// Marks the turn as failed.
    ///
    /// Content merged so far is kept. A sealed turn stays sealed.
    #[inline]
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = TurnState::Failed;
            self.open_idx = None;
        }
    }

    fn seal(&mut self) {
        self.state = TurnState::Sealed;
        self.open_idx = None;
    }

    fn update_open(&mut self, f: impl FnOnce(&mut ChatMessage)) -> Applied {
        let open = self.open_idx.and_then(|idx| {
            self.transcript.get(idx).map(|msg| (idx, msg.clone()))
        });

        // Events after a seal open a new message rather than mutating the
        // sealed one. The turn itself stays sealed.
        self.transcript = match open {
            Some((idx, mut msg)) => {
                f(&mut msg);
                self.transcript.replace(idx, msg)
            }
            None => {
                let mut msg = ChatMessage::assistant("");
                f(&mut msg);
                debug!("opening an assistant message");
                self.open_idx = Some(self.transcript.len());
                self.transcript.push(msg)
            }
        };
        if !self.state.is_terminal() {
            self.state = TurnState::Streaming;
        }

        Applied::Updated(self.transcript.clone())
    }
}

#[inline]
fn object_or_empty(name: &str, args: Value) -> Map<String, Value> {
    match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            debug!("tool call `{name}` has non-object args: {other}");
            Map::new()
        }
    }
}

mod builder;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use medimg_chat_model::{ChatMessage, ChatRequest, Transcript, TransportError};
use medimg_chat_stream::{Turn, TurnUpdate};
use tokio::select;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::Instrument;

use crate::chat_client::ChatClient;
pub use builder::ChatSessionBuilder;

/// The ceiling of one turn, after which the turn is treated as failed.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

/// The assistant message appended when a turn fails.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. \
     Please try again.";

/// The assistant message appended when a turn times out.
pub const DEFAULT_TIMEOUT_MESSAGE: &str =
    "The request timed out. Please try again.";

/// Events a session reports to its observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The transcript has a new snapshot.
    Transcript(Transcript),
    /// The server reported an error during the turn.
    ServerError(String),
    /// The turn completed.
    Completed,
    /// The turn failed because of the transport.
    Failed(TransportError),
    /// The turn hit the time ceiling.
    TimedOut,
    /// The turn was stopped by the user.
    Cancelled,
}

/// How a turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEnd {
    /// The response was received completely.
    Completed,
    /// The transport failed, a fallback message was appended.
    Failed(TransportError),
    /// The turn took too long, a timeout message was appended.
    TimedOut,
    /// The user stopped the turn, the partial response is kept as is.
    Cancelled,
}

/// The result of sending a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    /// The transcript after the turn.
    pub transcript: Transcript,
    /// How the turn ended.
    pub end: TurnEnd,
}

/// The error type for [`ChatSession::send_message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionError {
    /// The message is empty or blank.
    EmptyMessage,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyMessage => write!(f, "Message is required"),
        }
    }
}

impl StdError for SessionError {}

/// A handle for stopping the turn that is currently running.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Requests the running turn to stop.
    ///
    /// The transcript keeps whatever the turn has received so far. A
    /// request made while no turn is running has no effect.
    #[inline]
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

type EventFn = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// A chat session, like a chat view that displays the transcript and has
/// an input box.
///
/// The session owns the transcript for its lifetime. Turns run one at a
/// time, each one on top of the transcript the previous one left.
pub struct ChatSession {
    client: ChatClient,
    transcript: Transcript,
    turn_timeout: Duration,
    fallback_message: String,
    timeout_message: String,
    stop_tx: Arc<watch::Sender<bool>>,
    on_event: Option<EventFn>,
}

impl ChatSession {
    /// Returns the current transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns a handle for stopping running turns.
    #[inline]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_tx))
    }

    /// Discards the transcript and starts over.
    pub fn clear(&mut self) {
        self.set_transcript(Transcript::new());
    }

    /// Sends a user message and streams the assistant's response.
    ///
    /// Every transcript change is reported to the observer while the turn
    /// runs. The returned report tells how the turn ended, failures of the
    /// turn are not errors of this method.
    pub async fn send_message(
        &mut self,
        input: &str,
    ) -> Result<TurnReport, SessionError> {
        let message = input.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        // History is what the transcript was before this message.
        let request = ChatRequest {
            message: message.to_owned(),
            history: self.transcript.history(),
        };
        self.set_transcript(self.transcript.push(ChatMessage::user(message)));

        // Stop requests made before this turn don't apply to it.
        self.stop_tx.send_replace(false);
        let mut stop_rx = self.stop_tx.subscribe();
        let deadline = Instant::now() + self.turn_timeout;

        let end = self
            .run_turn(request, &mut stop_rx, deadline)
            .instrument(debug_span!("chat turn"))
            .await;

        match &end {
            TurnEnd::Completed => {
                debug!("turn completed");
                self.emit(&SessionEvent::Completed);
            }
            TurnEnd::Failed(err) => {
                error!("turn failed: {err}");
                let fallback = ChatMessage::assistant(&self.fallback_message);
                self.set_transcript(self.transcript.push(fallback));
                self.emit(&SessionEvent::Failed(err.clone()));
            }
            TurnEnd::TimedOut => {
                warn!("turn timed out after {:?}", self.turn_timeout);
                let notice = ChatMessage::assistant(&self.timeout_message);
                self.set_transcript(self.transcript.push(notice));
                self.emit(&SessionEvent::TimedOut);
            }
            TurnEnd::Cancelled => {
                info!("turn stopped by the user");
                self.emit(&SessionEvent::Cancelled);
            }
        }

        Ok(TurnReport {
            transcript: self.transcript.clone(),
            end,
        })
    }

    async fn run_turn(
        &mut self,
        request: ChatRequest,
        stop_rx: &mut watch::Receiver<bool>,
        deadline: Instant,
    ) -> TurnEnd {
        let body = select! {
            biased;
            _ = stop_rx.wait_for(|stop| *stop) => return TurnEnd::Cancelled,
            _ = sleep_until(deadline) => return TurnEnd::TimedOut,
            result = self.client.open_stream(request) => match result {
                Ok(body) => body,
                Err(err) => return TurnEnd::Failed(err),
            },
        };

        let mut turn = Turn::new(self.transcript.clone(), body);
        loop {
            select! {
                biased;
                _ = stop_rx.wait_for(|stop| *stop) => {
                    return TurnEnd::Cancelled;
                }
                _ = sleep_until(deadline) => return TurnEnd::TimedOut,
                update = turn.next_update() => match update {
                    Ok(Some(TurnUpdate::Snapshot(transcript))) => {
                        self.set_transcript(transcript);
                    }
                    Ok(Some(TurnUpdate::Notice(message))) => {
                        self.emit(&SessionEvent::ServerError(message));
                    }
                    Ok(None) => return TurnEnd::Completed,
                    Err(err) => return TurnEnd::Failed(err),
                },
            }
        }
    }

    fn set_transcript(&mut self, transcript: Transcript) {
        self.transcript = transcript;
        if let Some(on_event) = &self.on_event {
            on_event(&SessionEvent::Transcript(self.transcript.clone()));
        }
    }

    #[inline]
    fn emit(&self, event: &SessionEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }
}

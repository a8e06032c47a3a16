use std::sync::Arc;
use std::time::Duration;

use medimg_chat_model::{ChatTransport, Transcript};
use tokio::sync::watch;

use super::{
    ChatSession, DEFAULT_FALLBACK_MESSAGE, DEFAULT_TIMEOUT_MESSAGE,
    DEFAULT_TURN_TIMEOUT, EventFn, SessionEvent,
};
use crate::chat_client::ChatClient;

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder {
    client: ChatClient,
    turn_timeout: Duration,
    fallback_message: String,
    timeout_message: String,
    on_event: Option<EventFn>,
}

impl ChatSessionBuilder {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport<T: ChatTransport + 'static>(transport: T) -> Self {
        Self::with_client(ChatClient::new(transport))
    }

    /// Creates a new builder sharing an existing client.
    #[inline]
    pub fn with_client(client: ChatClient) -> Self {
        Self {
            client,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_owned(),
            timeout_message: DEFAULT_TIMEOUT_MESSAGE.to_owned(),
            on_event: None,
        }
    }

    /// Sets the ceiling of one turn.
    #[inline]
    pub fn turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Sets the assistant message appended when a turn fails.
    #[inline]
    pub fn fallback_message<S: Into<String>>(mut self, message: S) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Sets the assistant message appended when a turn times out.
    #[inline]
    pub fn timeout_message<S: Into<String>>(mut self, message: S) -> Self {
        self.timeout_message = message.into();
        self
    }

    /// Attaches a callback to be invoked for every session event.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(on_event));
        self
    }

    /// Builds the session, starting with an empty transcript.
    #[inline]
    pub fn build(self) -> ChatSession {
        let Self {
            client,
            turn_timeout,
            fallback_message,
            timeout_message,
            on_event,
        } = self;

        let (stop_tx, _) = watch::channel(false);
        ChatSession {
            client,
            transcript: Transcript::new(),
            turn_timeout,
            fallback_message,
            timeout_message,
            stop_tx: Arc::new(stop_tx),
            on_event,
        }
    }
}

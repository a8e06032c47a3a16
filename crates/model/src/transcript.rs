use std::sync::Arc;

use crate::{ChatMessage, HistoryEntry};

/// An ordered, persistent sequence of chat messages.
///
/// `Transcript` is a snapshot value: every mutating operation leaves the
/// receiver untouched and returns a new transcript. Cloning is cheap and
/// shares the message storage, so a UI layer can keep the snapshot it
/// rendered last and detect changes with [`Transcript::ptr_eq`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Arc<[Arc<ChatMessage>]>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the transcript has no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the message at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index).map(|msg| msg.as_ref())
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last().map(|msg| msg.as_ref())
    }

    /// Iterates over the messages in chronological order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().map(|msg| msg.as_ref())
    }

    /// Returns a new transcript with `message` appended.
    pub fn push(&self, message: ChatMessage) -> Self {
        let messages = self
            .messages
            .iter()
            .cloned()
            .chain([Arc::new(message)])
            .collect();
        Self { messages }
    }

    /// Returns a new transcript with the message at `index` replaced.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace(&self, index: usize, message: ChatMessage) -> Self {
        assert!(index < self.len(), "message index out of bounds");
        let mut message = Some(message);
        let messages = self
            .messages
            .iter()
            .enumerate()
            .map(|(idx, msg)| match message.take_if(|_| idx == index) {
                Some(message) => Arc::new(message),
                None => Arc::clone(msg),
            })
            .collect();
        Self { messages }
    }

    /// Returns the conversation history to replay upstream.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.iter()
            .map(|msg| HistoryEntry {
                role: msg.role,
                content: msg.content.clone(),
            })
            .collect()
    }

    /// Returns `true` if both transcripts are the same snapshot.
    ///
    /// Two snapshots can be equal by value but still be different
    /// snapshots, this is an identity comparison.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.messages, &other.messages)
    }
}

use std::collections::VecDeque;

use medimg_chat_model::{ChunkStream, Transcript, TransportError};

use crate::io::Sse;
use crate::reducer::{Applied, TranscriptReducer, TurnState};

/// An observable change produced by a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnUpdate {
    /// The transcript changed.
    Snapshot(Transcript),
    /// The server reported an error, the turn goes on.
    Notice(String),
}

/// One assistant turn, reading a chat stream body into a transcript.
pub struct Turn<S> {
    sse: Sse<S>,
    reducer: TranscriptReducer,
    // Payloads of the current frame that are not applied yet.
    pending_payloads: VecDeque<String>,
    finished: bool,
}

impl<S: ChunkStream> Turn<S> {
    /// Creates a turn that applies `body` on top of `transcript`.
    #[inline]
    pub fn new(transcript: Transcript, body: S) -> Self {
        Self {
            sse: Sse::new(body),
            reducer: TranscriptReducer::new(transcript),
            pending_payloads: Default::default(),
            finished: false,
        }
    }

    /// Returns the latest snapshot, which may be partial.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        self.reducer.transcript()
    }

    /// Returns the turn state.
    #[inline]
    pub fn state(&self) -> TurnState {
        self.reducer.state()
    }

    /// Consumes the turn and returns the latest snapshot.
    #[inline]
    pub fn into_transcript(self) -> Transcript {
        self.reducer.into_transcript()
    }

    /// Waits for the next observable change.
    ///
    /// Returns `Ok(None)` when the stream has ended and the turn is sealed.
    /// A transport error fails the turn and is returned once, content
    /// merged before it stays in the transcript. A transport error after
    /// the response has been sealed by `done` is logged and treated as the
    /// end of the stream.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. If the future is dropped, the turn
    /// keeps its partial transcript and no received data is lost.
    pub async fn next_update(
        &mut self,
    ) -> Result<Option<TurnUpdate>, TransportError> {
        loop {
            while let Some(payload) = self.pending_payloads.pop_front() {
                match self.reducer.apply_payload(&payload) {
                    Applied::Updated(transcript) => {
                        return Ok(Some(TurnUpdate::Snapshot(transcript)));
                    }
                    Applied::Notice(message) => {
                        return Ok(Some(TurnUpdate::Notice(message)));
                    }
                    Applied::Sealed | Applied::Ignored => {}
                }
            }

            if self.finished {
                return Ok(None);
            }

            match self.sse.next_frame().await {
                Ok(Some(frame)) => {
                    trace!("got a frame: {:?}", frame.as_str());
                    self.reducer.begin();
                    self.pending_payloads
                        .extend(frame.data().map(ToOwned::to_owned));
                }
                Ok(None) => {
                    self.finished = true;
                    self.reducer.finish();
                    debug!("stream ended");
                }
                Err(err) => {
                    self.finished = true;
                    if self.reducer.state() == TurnState::Sealed {
                        warn!("stream failed after the response was sealed");
                        return Ok(None);
                    }
                    error!("stream failed: {err}");
                    self.reducer.fail();
                    return Err(err);
                }
            }
        }
    }

    /// Drives the turn to its end, passing every update to `on_update`.
    ///
    /// Returns the final transcript together with the transport error
    /// that failed the turn, if any.
    pub async fn run(
        mut self,
        mut on_update: impl FnMut(TurnUpdate),
    ) -> (Transcript, Result<(), TransportError>) {
        let result = loop {
            match self.next_update().await {
                Ok(Some(update)) => on_update(update),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        (self.into_transcript(), result)
    }
}

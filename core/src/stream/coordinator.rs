use super::message::{StreamEvent, StreamKind, TurnId, UiSender};
use super::sender::AiSender;
use super::worker::{PendingRequest, WorkerHandle};
use crate::chat::ChatSurface;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// Worker started, no fragment seen yet.
    Dispatching,
    /// At least one fragment applied; the assistant bubble is open.
    Streaming,
}

/// How the most recent turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Finished,
    Cancelled,
    Errored,
}

/// Owns the single active worker and sequences its output onto the chat surface.
///
/// Lives on the UI thread. Events from any turn other than the active one, or
/// from a cancelled one, are dropped in [`apply`](Self::apply).
pub struct ResponseCoordinator<C> {
    chat: C,
    sender: Arc<dyn AiSender>,
    ui: UiSender,
    next_turn: u64,
    active: Option<WorkerHandle>,
    /// Attachments of the active turn.
    attachments: Vec<PathBuf>,
    /// Attachments of ended turns, waiting for [`take_spent_attachments`](Self::take_spent_attachments).
    spent: Vec<PathBuf>,
    state: TurnState,
    last_outcome: Option<TurnOutcome>,
}

impl<C: ChatSurface> ResponseCoordinator<C> {
    pub fn new(chat: C, sender: Arc<dyn AiSender>, ui: UiSender) -> Self {
        Self {
            chat,
            sender,
            ui,
            next_turn: 1,
            active: None,
            attachments: Vec::new(),
            spent: Vec::new(),
            state: TurnState::Idle,
            last_outcome: None,
        }
    }

    /// Starts a turn, superseding any turn still in flight.
    pub fn handle_message(&mut self, request: PendingRequest) {
        self.cancel_active();

        self.chat.add_message(&request.display_text(), true);

        let turn = TurnId(self.next_turn);
        self.next_turn += 1;
        let attachments = request.attachments.clone();
        match WorkerHandle::spawn(turn, request, Arc::clone(&self.sender), self.ui.clone()) {
            Ok(handle) => {
                debug!(turn = turn.0, "turn dispatched");
                self.active = Some(handle);
                self.attachments = attachments;
                self.state = TurnState::Dispatching;
            }
            Err(e) => {
                error!(error = %e, "failed to start stream worker");
                self.chat
                    .show_stream_error(&format!("Error generating response: {e}"));
                self.spent.extend(attachments);
                self.state = TurnState::Idle;
                self.last_outcome = Some(TurnOutcome::Errored);
            }
        }
    }

    /// Cancels the in-flight turn, if any, and closes its bubble.
    pub fn stop(&mut self) {
        self.cancel_active();
    }

    fn cancel_active(&mut self) {
        let Some(handle) = self.active.take() else {
            return;
        };
        handle.cancel();
        debug!(turn = handle.turn().0, "turn cancelled");
        self.chat.finalize_assistant_stream();
        self.spent.append(&mut self.attachments);
        self.state = TurnState::Idle;
        self.last_outcome = Some(TurnOutcome::Cancelled);
    }

    /// Applies one event drained from the UI queue.
    pub fn apply(&mut self, event: StreamEvent) {
        let Some(active) = &self.active else {
            debug!(turn = event.turn.0, "dropping event with no active turn");
            return;
        };
        if active.turn() != event.turn || active.is_cancelled() {
            debug!(turn = event.turn.0, "dropping event from superseded turn");
            return;
        }

        match event.kind {
            StreamKind::Fragment(fragment) => {
                if self.state == TurnState::Dispatching {
                    self.chat.start_assistant_stream();
                    self.state = TurnState::Streaming;
                }
                self.chat.append_to_stream(&fragment);
            }
            StreamKind::Finished(_) => {
                self.chat.finalize_assistant_stream();
                self.finish(TurnOutcome::Finished);
            }
            StreamKind::Failed(err) => {
                // Before the first fragment there is no bubble to replace, so the
                // surface appends a standalone error instead.
                self.chat
                    .show_stream_error(&format!("Error generating response: {err}"));
                warn!(turn = event.turn.0, "turn ended with error");
                self.finish(TurnOutcome::Errored);
            }
        }
    }

    fn finish(&mut self, outcome: TurnOutcome) {
        self.active = None;
        self.spent.append(&mut self.attachments);
        self.state = TurnState::Idle;
        self.last_outcome = Some(outcome);
    }

    /// Clears the chat surface. Any in-flight turn is cancelled first.
    pub fn clear(&mut self) {
        self.cancel_active();
        self.chat.clear();
    }

    /// Attachments of every turn that ended since the last call.
    ///
    /// A cancelled worker may still hold one of these paths; it only ever reads
    /// them and treats a missing file as a skipped attachment.
    pub fn take_spent_attachments(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.spent)
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn last_outcome(&self) -> Option<TurnOutcome> {
        self.last_outcome
    }

    pub fn active_turn(&self) -> Option<TurnId> {
        self.active.as_ref().map(WorkerHandle::turn)
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut C {
        &mut self.chat
    }
}

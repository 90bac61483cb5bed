//! The assistant facade the platform shell drives.

use crate::chat::ChatSurface;
use crate::error::{CaptureError, HookError};
use crate::hook::{HookEngine, HookPump, HookThread};
use crate::screenshot::Screenshots;
use crate::stream::{
    AiSender, PendingRequest, ResponseCoordinator, StreamEvent, TurnOutcome, TurnState, UiSender,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Chat turns, screenshots and the hook thread behind one UI-thread object.
pub struct Assistant<C, S> {
    coordinator: ResponseCoordinator<C>,
    screenshots: S,
    hook: Option<HookThread>,
}

impl<C: ChatSurface, S: Screenshots> Assistant<C, S> {
    pub fn new(chat: C, screenshots: S, sender: Arc<dyn AiSender>, ui: UiSender) -> Self {
        Self {
            coordinator: ResponseCoordinator::new(chat, sender, ui),
            screenshots,
            hook: None,
        }
    }

    /// Sends `text` with `attachments`, superseding any turn in flight.
    pub fn handle_message(&mut self, text: &str, attachments: Vec<PathBuf>) {
        self.coordinator
            .handle_message(PendingRequest::new(text, attachments));
        self.release_spent();
    }

    /// Sends `text` with every pending screenshot. Returns false if there was nothing to send.
    pub fn send_input(&mut self, text: &str) -> bool {
        let attachments = self.screenshots.get_and_clear_pending();
        if text.trim().is_empty() && attachments.is_empty() {
            debug!("ignoring empty message");
            return false;
        }
        self.handle_message(text.trim(), attachments);
        true
    }

    /// Queues a screenshot for the next message.
    pub fn capture_screenshot(&mut self) -> Result<PathBuf, CaptureError> {
        let path = self.screenshots.capture()?;
        info!(path = %path.display(), "screenshot queued");
        Ok(path)
    }

    /// Captures the screen, then sends `text` with all pending screenshots.
    ///
    /// A failed capture is logged and the message goes out with whatever was
    /// already pending.
    pub fn send_with_screenshot(&mut self, text: &str) -> bool {
        if let Err(e) = self.capture_screenshot() {
            warn!(error = %e, "screenshot capture failed");
        }
        self.send_input(text)
    }

    /// [`send_with_screenshot`](Self::send_with_screenshot) with a canned prompt.
    pub fn send_with_screenshot_fix(&mut self, prompt: &str) -> bool {
        self.send_with_screenshot(prompt)
    }

    /// Cancels the turn in flight, if any.
    pub fn stop(&mut self) {
        self.coordinator.stop();
        self.release_spent();
    }

    /// Cancels the turn in flight, empties the chat and drops all screenshots.
    pub fn clear(&mut self) {
        self.coordinator.clear();
        self.screenshots.clear();
        self.release_spent();
    }

    /// Applies a stream event drained from the UI queue.
    pub fn apply(&mut self, event: StreamEvent) {
        self.coordinator.apply(event);
        self.release_spent();
    }

    fn release_spent(&mut self) {
        let spent = self.coordinator.take_spent_attachments();
        if !spent.is_empty() {
            debug!(count = spent.len(), "releasing screenshots of ended turn");
            self.screenshots.release(&spent);
        }
    }

    /// Starts the global hook thread. A no-op if it is already running.
    pub fn start_hook<P, F>(&mut self, make_pump: F, engine: HookEngine) -> Result<(), HookError>
    where
        P: HookPump + 'static,
        F: FnOnce() -> P + Send + 'static,
    {
        if self.hook.as_ref().is_some_and(HookThread::is_running) {
            return Ok(());
        }
        self.hook = Some(HookThread::spawn(make_pump, engine)?);
        Ok(())
    }

    pub fn stop_hook(&mut self) {
        if let Some(mut hook) = self.hook.take() {
            hook.stop();
        }
    }

    pub fn is_hook_running(&self) -> bool {
        self.hook.as_ref().is_some_and(HookThread::is_running)
    }

    pub fn state(&self) -> TurnState {
        self.coordinator.state()
    }

    pub fn last_outcome(&self) -> Option<TurnOutcome> {
        self.coordinator.last_outcome()
    }

    pub fn chat(&self) -> &C {
        self.coordinator.chat()
    }

    pub fn chat_mut(&mut self) -> &mut C {
        self.coordinator.chat_mut()
    }

    pub fn screenshots(&self) -> &S {
        &self.screenshots
    }

    pub fn screenshots_mut(&mut self) -> &mut S {
        &mut self.screenshots
    }
}

use super::message::{CancelToken, StreamKind, TurnId, UiSender};
use super::sender::AiSender;
use std::any::Any;
use std::io;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

/// Input for one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingRequest {
    pub input: String,
    pub attachments: Vec<PathBuf>,
}

impl PendingRequest {
    pub fn new(input: impl Into<String>, attachments: Vec<PathBuf>) -> Self {
        Self {
            input: input.into(),
            attachments,
        }
    }

    /// What the user bubble shows: the input, or a label for attachment-only turns.
    pub fn display_text(&self) -> String {
        match (self.input.is_empty(), self.attachments.len()) {
            (false, _) | (true, 0) => self.input.clone(),
            (true, 1) => "[screenshot]".to_string(),
            (true, n) => format!("[{n} screenshots]"),
        }
    }
}

/// The coordinator's handle on a running worker.
///
/// The thread is detached; cancellation is only ever cooperative.
pub struct WorkerHandle {
    turn: TurnId,
    cancel: CancelToken,
}

impl WorkerHandle {
    /// Starts the worker thread for `turn`.
    pub fn spawn(
        turn: TurnId,
        request: PendingRequest,
        sender: Arc<dyn AiSender>,
        ui: UiSender,
    ) -> io::Result<Self> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        thread::Builder::new()
            .name(format!("whispr-stream-{}", turn.0))
            .spawn(move || run(turn, request, sender.as_ref(), &ui, &token))?;
        Ok(Self { turn, cancel })
    }

    pub fn turn(&self) -> TurnId {
        self.turn
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

fn run(
    turn: TurnId,
    request: PendingRequest,
    sender: &dyn AiSender,
    ui: &UiSender,
    cancel: &CancelToken,
) {
    debug!(
        turn = turn.0,
        attachments = request.attachments.len(),
        "stream worker started"
    );

    let mut on_fragment = |fragment: &str| {
        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        if !fragment.is_empty() {
            ui.send_stream(turn, StreamKind::Fragment(fragment.to_string()));
        }
        ControlFlow::Continue(())
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        sender.stream(&request.input, &request.attachments, &mut on_fragment)
    }));

    if cancel.is_cancelled() {
        info!(turn = turn.0, "stream cancelled");
        return;
    }

    let kind = match outcome {
        Ok(Ok(full)) => {
            debug!(turn = turn.0, len = full.len(), "stream finished");
            StreamKind::Finished(full)
        }
        Ok(Err(e)) => {
            error!(turn = turn.0, error = %e, "stream failed");
            StreamKind::Failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(turn = turn.0, panic = %message, "sender panicked");
            StreamKind::Failed(message)
        }
    };
    ui.send_stream(turn, kind);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure in response stream".to_string()
    }
}

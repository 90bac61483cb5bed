use crate::hook::ActionSink;
use crate::hotkey::Action;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::trace;

/// Identifies one conversation turn. Strictly increasing per coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Fragment(String),
    /// Terminal success with the accumulated response.
    Finished(String),
    /// Terminal failure with a description of the error.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamEvent {
    pub turn: TurnId,
    pub kind: StreamKind,
}

/// Everything other threads hand to the UI thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiMessage {
    Stream(StreamEvent),
    /// A hotkey matched on the hook thread.
    Action(Action),
}

/// Nudges the UI thread's event loop after a message was queued.
///
/// Called from the hook and worker threads, so it must be cheap and non-blocking
/// (posting a window message, for example).
pub trait Waker: Send + Sync {
    fn wake(&self);
}

impl<F: Fn() + Send + Sync> Waker for F {
    fn wake(&self) {
        self()
    }
}

/// Producer half of the UI queue. Cloned into every thread that talks to the UI.
#[derive(Clone)]
pub struct UiSender {
    tx: Sender<UiMessage>,
    waker: Arc<dyn Waker>,
}

impl UiSender {
    /// Queues `message` and wakes the UI thread. Returns false once the UI side is gone.
    pub fn send(&self, message: UiMessage) -> bool {
        if self.tx.send(message).is_err() {
            trace!("ui queue closed, message dropped");
            return false;
        }
        self.waker.wake();
        true
    }

    pub fn send_stream(&self, turn: TurnId, kind: StreamKind) -> bool {
        self.send(UiMessage::Stream(StreamEvent { turn, kind }))
    }
}

impl ActionSink for UiSender {
    fn dispatch(&self, action: Action) {
        self.send(UiMessage::Action(action));
    }
}

/// Consumer half, owned by the UI thread.
pub struct UiQueue {
    rx: Receiver<UiMessage>,
}

impl UiQueue {
    /// Takes everything queued so far, in arrival order, without blocking.
    pub fn drain(&self) -> Vec<UiMessage> {
        self.rx.try_iter().collect()
    }
}

pub fn ui_channel(waker: impl Waker + 'static) -> (UiSender, UiQueue) {
    let (tx, rx) = mpsc::channel();
    (
        UiSender {
            tx,
            waker: Arc::new(waker),
        },
        UiQueue { rx },
    )
}

/// One-way cancellation flag shared between the coordinator and a worker.
///
/// Goes from clear to set exactly once; a live worker's token is never reset.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

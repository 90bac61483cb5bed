//! Streaming response pipeline: the worker thread, the UI-thread coordinator
//! and the channel between them.

mod coordinator;
mod message;
mod sender;
mod worker;

pub use coordinator::{ResponseCoordinator, TurnOutcome, TurnState};
pub use message::{
    CancelToken, StreamEvent, StreamKind, TurnId, UiMessage, UiQueue, UiSender, Waker, ui_channel,
};
pub use sender::AiSender;
pub use worker::{PendingRequest, WorkerHandle};

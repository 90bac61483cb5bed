use crate::error::SendError;
use std::ops::ControlFlow;
use std::path::PathBuf;

/// Streaming call to the language model.
///
/// Invoked on a worker thread, once per turn. `on_fragment` receives each piece
/// of text as it arrives; returning [`ControlFlow::Break`] asks the sender to stop
/// reading early. On success the accumulated response is returned.
pub trait AiSender: Send + Sync {
    fn stream(
        &self,
        input: &str,
        attachments: &[PathBuf],
        on_fragment: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<String, SendError>;
}

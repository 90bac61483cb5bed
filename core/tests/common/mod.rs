#![allow(dead_code)]

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use whispr_core::Assistant;
use whispr_core::chat::{ChatSurface, Transcript};
use whispr_core::error::{CaptureError, SendError};
use whispr_core::screenshot::Screenshots;
use whispr_core::stream::{AiSender, UiMessage, UiQueue, UiSender, ui_channel};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// One scripted step of a fake response stream.
pub enum Step {
    Fragment(&'static str),
    Finish,
    Fail(&'static str),
}

/// Test-side control of one `stream` call.
pub struct Script {
    steps: Sender<Step>,
    returned: Receiver<Vec<String>>,
}

impl Script {
    pub fn push(&self, step: Step) {
        // The worker may have stopped reading already.
        let _ = self.steps.send(step);
    }

    pub fn fragments(&self, fragments: &[&'static str]) {
        for fragment in fragments {
            self.push(Step::Fragment(fragment));
        }
    }

    /// Waits for the call to return and yields the fragments it delivered.
    pub fn wait_returned(&self) -> Vec<String> {
        self.returned
            .recv_timeout(TIMEOUT)
            .expect("stream call did not return")
    }
}

/// [`AiSender`] whose calls are driven step by step from the test thread.
#[derive(Clone, Default)]
pub struct GatedSender {
    calls: Arc<Mutex<VecDeque<(Receiver<Step>, Sender<Vec<String>>)>>>,
    inputs: Arc<Mutex<Vec<(String, Vec<PathBuf>)>>>,
}

impl GatedSender {
    /// Prepares the script for the next `stream` call.
    pub fn script(&self) -> Script {
        let (steps_tx, steps_rx) = mpsc::channel();
        let (returned_tx, returned_rx) = mpsc::channel();
        self.calls.lock().unwrap().push_back((steps_rx, returned_tx));
        Script {
            steps: steps_tx,
            returned: returned_rx,
        }
    }

    pub fn inputs(&self) -> Vec<(String, Vec<PathBuf>)> {
        self.inputs.lock().unwrap().clone()
    }
}

impl AiSender for GatedSender {
    fn stream(
        &self,
        input: &str,
        attachments: &[PathBuf],
        on_fragment: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<String, SendError> {
        self.inputs
            .lock()
            .unwrap()
            .push((input.to_string(), attachments.to_vec()));
        let (steps, returned) = self
            .calls
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted stream call");

        let mut delivered = Vec::new();
        let mut full = String::new();
        let result = loop {
            match steps.recv() {
                Ok(Step::Fragment(text)) => {
                    full.push_str(text);
                    if on_fragment(text).is_break() {
                        break Ok(full);
                    }
                    delivered.push(text.to_string());
                }
                Ok(Step::Finish) | Err(_) => break Ok(full),
                Ok(Step::Fail(message)) => break Err(SendError::Provider(message.to_string())),
            }
        };
        let _ = returned.send(delivered);
        result
    }
}

/// [`AiSender`] that panics mid-stream.
pub struct PanickingSender;

impl AiSender for PanickingSender {
    fn stream(
        &self,
        _input: &str,
        _attachments: &[PathBuf],
        on_fragment: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<String, SendError> {
        let _ = on_fragment("partial");
        panic!("connection state corrupted");
    }
}

/// Chat surface call, as observed by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Add(String, bool),
    Start,
    Append(String),
    Finalize,
    Error(String),
    Clear,
}

/// A [`Transcript`] that also records every call made on it.
#[derive(Default)]
pub struct RecordingSurface {
    pub transcript: Transcript,
    pub calls: Vec<Call>,
}

impl ChatSurface for RecordingSurface {
    fn add_message(&mut self, text: &str, is_user: bool) {
        self.calls.push(Call::Add(text.to_string(), is_user));
        self.transcript.add_message(text, is_user);
    }

    fn start_assistant_stream(&mut self) {
        self.calls.push(Call::Start);
        self.transcript.start_assistant_stream();
    }

    fn append_to_stream(&mut self, fragment: &str) {
        self.calls.push(Call::Append(fragment.to_string()));
        self.transcript.append_to_stream(fragment);
    }

    fn finalize_assistant_stream(&mut self) {
        self.calls.push(Call::Finalize);
        self.transcript.finalize_assistant_stream();
    }

    fn show_stream_error(&mut self, message: &str) {
        self.calls.push(Call::Error(message.to_string()));
        self.transcript.show_stream_error(message);
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
        self.transcript.clear();
    }
}

/// In-memory [`Screenshots`] handing out fake paths.
#[derive(Default)]
pub struct FakeScreenshots {
    pub pending: Vec<PathBuf>,
    pub captured: usize,
    pub released: Vec<PathBuf>,
    pub fail: bool,
    pub cleared: bool,
}

impl Screenshots for FakeScreenshots {
    fn capture(&mut self) -> Result<PathBuf, CaptureError> {
        if self.fail {
            return Err(CaptureError::Platform("no display".to_string()));
        }
        self.captured += 1;
        let path = Path::new("shots").join(format!("shot-{}.png", self.captured));
        self.pending.push(path.clone());
        Ok(path)
    }

    fn get_and_clear_pending(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.pending)
    }

    fn release(&mut self, paths: &[PathBuf]) {
        self.released.extend_from_slice(paths);
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.cleared = true;
    }
}

pub type TestAssistant = Assistant<RecordingSurface, FakeScreenshots>;

/// Assistant wired to a UI queue, plus the means to pump that queue.
pub struct Harness {
    pub assistant: TestAssistant,
    pub queue: UiQueue,
    pub ui: UiSender,
    wakeups: Receiver<()>,
}

pub fn harness(sender: Arc<dyn AiSender>) -> Harness {
    let (wake_tx, wakeups) = mpsc::channel();
    let wake_tx = Mutex::new(wake_tx);
    let (ui, queue) = ui_channel(move || {
        let _ = wake_tx.lock().unwrap().send(());
    });
    let assistant = Assistant::new(
        RecordingSurface::default(),
        FakeScreenshots::default(),
        sender,
        ui.clone(),
    );
    Harness {
        assistant,
        queue,
        ui,
        wakeups,
    }
}

impl Harness {
    /// Applies everything currently queued, the way the UI thread's drain does.
    pub fn pump(&mut self) {
        for message in self.queue.drain() {
            if let UiMessage::Stream(event) = message {
                self.assistant.apply(event);
            }
        }
    }

    /// Pumps until `done` holds, failing the test after [`TIMEOUT`].
    pub fn pump_until(&mut self, mut done: impl FnMut(&TestAssistant) -> bool) {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            self.pump();
            if done(&self.assistant) {
                return;
            }
            assert!(Instant::now() < deadline, "condition not reached in time");
            let _ = self.wakeups.recv_timeout(Duration::from_millis(20));
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.assistant.chat().transcript
    }

    pub fn calls(&self) -> &[Call] {
        &self.assistant.chat().calls
    }
}

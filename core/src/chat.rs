//! Chat surface interface and the in-memory transcript behind the overlay.

/// Operations the response pipeline performs on the chat view.
///
/// UI-thread only. Implementations render however they like; the pipeline only
/// relies on the call order.
pub trait ChatSurface {
    fn add_message(&mut self, text: &str, is_user: bool);
    /// Opens the assistant bubble that fragments stream into.
    fn start_assistant_stream(&mut self);
    fn append_to_stream(&mut self, fragment: &str);
    /// Closes the open stream, if any, and stops the loading indicator.
    fn finalize_assistant_stream(&mut self);
    /// Replaces the open stream's content with an error and closes it. With no
    /// open stream the error becomes a standalone assistant message.
    fn show_stream_error(&mut self, message: &str);
    fn clear(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleState {
    Streaming,
    Complete,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub text: String,
    pub state: BubbleState,
}

/// Message history plus streaming state.
///
/// A user message raises the loading indicator; it stays up until the first
/// fragment opens the assistant bubble or the turn is finalized. At most one
/// bubble streams at a time.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
    streaming: Option<usize>,
    loading: bool,
    revision: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn streaming_bubble(&self) -> Option<&Bubble> {
        self.streaming.map(|i| &self.bubbles[i])
    }

    /// Incremented on every visible change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl ChatSurface for Transcript {
    fn add_message(&mut self, text: &str, is_user: bool) {
        let role = if is_user { Role::User } else { Role::Assistant };
        self.bubbles.push(Bubble {
            role,
            text: text.to_string(),
            state: BubbleState::Complete,
        });
        if is_user {
            self.loading = true;
        }
        self.touch();
    }

    fn start_assistant_stream(&mut self) {
        if self.streaming.is_some() {
            return;
        }
        self.loading = false;
        self.bubbles.push(Bubble {
            role: Role::Assistant,
            text: String::new(),
            state: BubbleState::Streaming,
        });
        self.streaming = Some(self.bubbles.len() - 1);
        self.touch();
    }

    fn append_to_stream(&mut self, fragment: &str) {
        let Some(index) = self.streaming else {
            return;
        };
        self.bubbles[index].text.push_str(fragment);
        self.touch();
    }

    fn finalize_assistant_stream(&mut self) {
        if let Some(index) = self.streaming.take() {
            self.bubbles[index].state = BubbleState::Complete;
        }
        self.loading = false;
        self.touch();
    }

    fn show_stream_error(&mut self, message: &str) {
        self.loading = false;
        match self.streaming.take() {
            Some(index) => {
                let bubble = &mut self.bubbles[index];
                bubble.text = message.to_string();
                bubble.state = BubbleState::Error;
            }
            None => self.bubbles.push(Bubble {
                role: Role::Assistant,
                text: message.to_string(),
                state: BubbleState::Error,
            }),
        }
        self.touch();
    }

    fn clear(&mut self) {
        self.bubbles.clear();
        self.streaming = None;
        self.loading = false;
        self.touch();
    }
}

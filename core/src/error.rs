use crate::hotkey::Action;
use thiserror::Error;

/// Any core failure, for callers that propagate rather than handle.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    #[error("send error: {0}")]
    Send(#[from] SendError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid shortcut for {action:?}: {shortcut:?}")]
    InvalidShortcut { action: Action, shortcut: String },

    #[error("{shortcut} is bound to both {first:?} and {second:?}")]
    DuplicateBinding {
        shortcut: String,
        first: Action,
        second: Action,
    },
}

#[derive(Error, Debug)]
pub enum HookError {
    #[error("keyboard hook installation failed: {0}")]
    Install(String),

    #[error("failed to spawn hook thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("hook thread exited before reporting readiness")]
    ThreadExited,
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("malformed stream chunk: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("nothing to send")]
    EmptyRequest,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("screen capture failed: {0}")]
    Platform(String),

    #[error("image encoding failed: {0}")]
    Encode(String),
}

//! Screenshot capture and the pending-attachment list.

use crate::error::CaptureError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "screenshot-";

/// What the response pipeline needs from screenshot handling. UI-thread only.
pub trait Screenshots {
    /// Captures the primary display and queues the image for the next message.
    fn capture(&mut self) -> Result<PathBuf, CaptureError>;

    /// Hands over every queued image and empties the queue.
    fn get_and_clear_pending(&mut self) -> Vec<PathBuf>;

    /// Deletes images handed to a turn that has since ended.
    fn release(&mut self, paths: &[PathBuf]);

    /// Drops queued images and deletes their files.
    fn clear(&mut self);
}

/// Platform screen grabber: writes a PNG of the primary display to `path`.
pub trait CaptureBackend {
    fn capture_to(&mut self, path: &Path) -> Result<(), CaptureError>;
}

/// [`Screenshots`] backed by files in a cache directory.
///
/// A file lives from capture until the turn it was sent with ends, or until
/// [`clear`](Screenshots::clear) if it was never sent.
pub struct ScreenshotStore<B> {
    backend: B,
    dir: PathBuf,
    pending: Vec<PathBuf>,
    counter: u64,
}

impl<B: CaptureBackend> ScreenshotStore<B> {
    /// Creates the store, creating `dir` if needed and deleting captures a
    /// previous session left behind.
    pub fn new(backend: B, dir: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let stale = purge_stale(&dir)?;
        if stale > 0 {
            info!(count = stale, dir = %dir.display(), "removed stale screenshots");
        }
        Ok(Self {
            backend,
            dir,
            pending: Vec::new(),
            counter: 0,
        })
    }

    pub fn pending(&self) -> &[PathBuf] {
        &self.pending
    }

    fn next_path(&mut self) -> PathBuf {
        self.counter += 1;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.dir
            .join(format!("{FILE_PREFIX}{millis}-{}.png", self.counter))
    }
}

impl<B: CaptureBackend> Screenshots for ScreenshotStore<B> {
    fn capture(&mut self) -> Result<PathBuf, CaptureError> {
        let path = self.next_path();
        self.backend.capture_to(&path)?;
        debug!(path = %path.display(), "screenshot captured");
        self.pending.push(path.clone());
        Ok(path)
    }

    fn get_and_clear_pending(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.pending)
    }

    fn release(&mut self, paths: &[PathBuf]) {
        for path in paths {
            remove_file(path);
        }
    }

    fn clear(&mut self) {
        for path in self.pending.drain(..) {
            remove_file(&path);
        }
    }
}

/// Deletes every capture file in `dir`. Other files are left alone.
fn purge_stale(dir: &Path) -> Result<usize, CaptureError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_capture = path.is_file()
            && path.extension().is_some_and(|ext| ext == "png")
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX));
        if is_capture {
            remove_file(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_file(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to delete screenshot");
    }
}

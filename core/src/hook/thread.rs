use super::HookEngine;
use crate::error::HookError;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Platform side of the hook thread.
///
/// Every method runs on the hook thread itself: the OS ties a low-level hook to
/// the message queue of the thread that installed it.
pub trait HookPump {
    type Stopper: PumpStopper;

    /// Prepares this thread's queue and returns the handle other threads use to end [`run`](Self::run).
    fn stopper(&mut self) -> Self::Stopper;

    fn install(&mut self, engine: HookEngine) -> Result<(), HookError>;

    /// Blocks pumping events until a shutdown is posted.
    fn run(&mut self);

    fn uninstall(&mut self);
}

/// Posts the shutdown message to a hook thread. Callable from any thread.
pub trait PumpStopper: Send + 'static {
    /// Returns false if the thread was already gone. Never fails otherwise.
    fn post_shutdown(&self) -> bool;
}

/// Owner of the dedicated hook thread.
pub struct HookThread {
    stopper: Box<dyn PumpStopper>,
    handle: Option<JoinHandle<()>>,
}

impl HookThread {
    /// Spawns the hook thread, builds the pump on it and installs the hook.
    ///
    /// Returns once installation has succeeded or failed. On failure the thread
    /// has already exited.
    pub fn spawn<P, F>(make_pump: F, engine: HookEngine) -> Result<Self, HookError>
    where
        P: HookPump + 'static,
        F: FnOnce() -> P + Send + 'static,
    {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<P::Stopper, HookError>>(1);

        let handle = thread::Builder::new()
            .name("whispr-hook".to_string())
            .spawn(move || {
                let mut pump = make_pump();
                let stopper = pump.stopper();
                if let Err(e) = pump.install(engine) {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                let _ = ready_tx.send(Ok(stopper));

                pump.run();
                pump.uninstall();
                debug!("hook thread exiting");
            })?;

        match ready_rx.recv() {
            Ok(Ok(stopper)) => {
                info!("keyboard hook installed");
                Ok(Self {
                    stopper: Box::new(stopper),
                    handle: Some(handle),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(HookError::ThreadExited)
            }
        }
    }

    /// Posts shutdown and waits for the thread to uninstall the hook.
    ///
    /// Idempotent: once the thread is joined nothing is posted again, since the
    /// OS may have handed its id to another thread.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !self.stopper.post_shutdown() {
            warn!("hook thread already gone before shutdown was posted");
        }
        if handle.join().is_err() {
            warn!("hook thread panicked");
        }
        info!("keyboard hook removed");
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for HookThread {
    fn drop(&mut self) {
        self.stop();
    }
}

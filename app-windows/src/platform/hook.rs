//! Low-level keyboard hook (`WH_KEYBOARD_LL`) behind the core's `HookPump` seam.
//!
//! The hook procedure has no user-data pointer, so the engine lives in a
//! thread-local on the hook thread. Only one hook thread exists per process.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};
use whispr_core::HookError;
use whispr_core::hook::{
    HookEngine, HookPump, KeyDirection, KeyEvent, ModifierSource, PumpStopper, Verdict,
};
use whispr_core::keys::Modifiers;
use windows::Win32::{
    Foundation::{LPARAM, LRESULT, WPARAM},
    System::{LibraryLoader::GetModuleHandleW, Threading::GetCurrentThreadId},
    UI::{
        Input::KeyboardAndMouse::{GetAsyncKeyState, VIRTUAL_KEY, VK_CONTROL, VK_MENU, VK_SHIFT},
        WindowsAndMessaging::{
            CallNextHookEx, DispatchMessageW, GetMessageW, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, MSG,
            PM_NOREMOVE, PeekMessageW, PostThreadMessageW, SetWindowsHookExW, TranslateMessage,
            UnhookWindowsHookEx, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN,
            WM_SYSKEYUP, WM_USER,
        },
    },
};

thread_local! {
    static ENGINE: RefCell<Option<HookEngine>> = const { RefCell::new(None) };
}

/// Reads Ctrl/Alt/Shift from the asynchronous key state.
pub struct AsyncKeyState;

impl ModifierSource for AsyncKeyState {
    fn current(&self) -> Modifiers {
        let mut modifiers = Modifiers::NONE;
        if is_down(VK_CONTROL) {
            modifiers |= Modifiers::CTRL;
        }
        if is_down(VK_MENU) {
            modifiers |= Modifiers::ALT;
        }
        if is_down(VK_SHIFT) {
            modifiers |= Modifiers::SHIFT;
        }
        modifiers
    }
}

fn is_down(key: VIRTUAL_KEY) -> bool {
    // High bit set means the key is down.
    unsafe { GetAsyncKeyState(i32::from(key.0)) < 0 }
}

/// Hook pump for the current thread's message queue.
#[derive(Default)]
pub struct Win32Pump {
    hook: Option<HHOOK>,
}

/// Ends a [`Win32Pump`] by posting `WM_QUIT` to its thread.
pub struct ThreadStopper {
    thread_id: u32,
}

impl PumpStopper for ThreadStopper {
    fn post_shutdown(&self) -> bool {
        // Fails harmlessly once the thread and its queue are gone.
        unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)).is_ok() }
    }
}

impl HookPump for Win32Pump {
    type Stopper = ThreadStopper;

    fn stopper(&mut self) -> ThreadStopper {
        unsafe {
            // Forces creation of this thread's message queue so an early
            // PostThreadMessageW is not lost.
            let mut msg = MSG::default();
            let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
            ThreadStopper {
                thread_id: GetCurrentThreadId(),
            }
        }
    }

    fn install(&mut self, engine: HookEngine) -> Result<(), HookError> {
        ENGINE.with(|cell| *cell.borrow_mut() = Some(engine));
        let installed = unsafe {
            GetModuleHandleW(None).and_then(|module| {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), Some(module.into()), 0)
            })
        };
        match installed {
            Ok(hook) => {
                self.hook = Some(hook);
                Ok(())
            }
            Err(e) => {
                ENGINE.with(|cell| cell.borrow_mut().take());
                Err(HookError::Install(e.to_string()))
            }
        }
    }

    fn run(&mut self) {
        let mut msg = MSG::default();
        unsafe {
            // 0 is WM_QUIT, -1 an error; both end the loop.
            while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        debug!("hook message loop ended");
    }

    fn uninstall(&mut self) {
        if let Some(hook) = self.hook.take()
            && let Err(e) = unsafe { UnhookWindowsHookEx(hook) }
        {
            error!(error = %e, "UnhookWindowsHookEx failed");
        }
        ENGINE.with(|cell| cell.borrow_mut().take());
    }
}

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32
        && let Some(event) = key_event(wparam, lparam)
    {
        let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
            ENGINE.with(|cell| {
                // A nested call while the engine is borrowed passes through.
                let mut engine = cell.try_borrow_mut().ok()?;
                engine.as_mut().map(|engine| engine.handle(event))
            })
        }));
        match verdict {
            Ok(Some(Verdict::Suppress)) => return LRESULT(1),
            Ok(_) => {}
            Err(_) => error!("keyboard hook handler panicked; event passed through"),
        }
    }
    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

fn key_event(wparam: WPARAM, lparam: LPARAM) -> Option<KeyEvent> {
    let direction = match wparam.0 as u32 {
        WM_KEYDOWN | WM_SYSKEYDOWN => KeyDirection::Down,
        WM_KEYUP | WM_SYSKEYUP => KeyDirection::Up,
        _ => return None,
    };
    // SAFETY: for HC_ACTION, lparam points to a KBDLLHOOKSTRUCT owned by the OS.
    let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
    Some(KeyEvent {
        vk_code: info.vkCode,
        direction,
    })
}

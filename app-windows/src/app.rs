//! Application state owned by the overlay window. UI thread only.

use crate::platform::hook::{AsyncKeyState, Win32Pump};
use crate::platform::screenshot::GdiCapture;
use crate::platform::tray::{TrayStatus, add_tray_icon, set_tray_tip, tooltip};
use crate::platform::window::{
    self, CHAT_BOTTOM_INSET, invalidate, move_window_to, take_edit_text, work_area,
};
use crate::platform::wm::{DRAIN_QUEUE, TIMER_ANIMATION};
use crate::render;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use whispr_core::Assistant;
use whispr_core::animation::{Direction, MoveGeometry, Point, Scroller, WindowMover};
use whispr_core::chat::{ChatSurface, Transcript};
use whispr_core::config::{AppConfig, ShortcutsConfig, screenshots_dir};
use whispr_core::error::SendError;
use whispr_core::gemini::GeminiSender;
use whispr_core::hook::{HookEngine, VisibilityGate};
use whispr_core::hotkey::{Action, HotkeyTables};
use whispr_core::screenshot::ScreenshotStore;
use whispr_core::stream::{AiSender, UiMessage, UiQueue, UiSender, ui_channel};
use windows::Win32::{
    Foundation::{HWND, LPARAM, RECT, WPARAM},
    Graphics::Gdi::HDC,
    UI::{
        Input::KeyboardAndMouse::SetFocus,
        WindowsAndMessaging::{
            GetClientRect, GetWindowRect, IsIconic, IsWindowVisible, KillTimer, PostMessageW,
            SW_HIDE, SW_MINIMIZE, SW_RESTORE, SW_SHOW, SetForegroundWindow, SetTimer, ShowWindow,
            WM_CLOSE,
        },
    },
};

/// [`Transcript`] that repaints the window on every change.
pub struct ChatView {
    transcript: Transcript,
    hwnd: HWND,
    /// Set on new content; the next paint scrolls to the bottom.
    follow: bool,
}

impl ChatView {
    fn new(hwnd: HWND) -> Self {
        Self {
            transcript: Transcript::new(),
            hwnd,
            follow: false,
        }
    }

    fn changed(&mut self) {
        self.follow = true;
        invalidate(self.hwnd);
    }
}

impl ChatSurface for ChatView {
    fn add_message(&mut self, text: &str, is_user: bool) {
        self.transcript.add_message(text, is_user);
        self.changed();
    }

    fn start_assistant_stream(&mut self) {
        self.transcript.start_assistant_stream();
        self.changed();
    }

    fn append_to_stream(&mut self, fragment: &str) {
        self.transcript.append_to_stream(fragment);
        self.changed();
    }

    fn finalize_assistant_stream(&mut self) {
        self.transcript.finalize_assistant_stream();
        invalidate(self.hwnd);
    }

    fn show_stream_error(&mut self, message: &str) {
        self.transcript.show_stream_error(message);
        self.changed();
    }

    fn clear(&mut self) {
        self.transcript.clear();
        invalidate(self.hwnd);
    }
}

/// Stands in for the model client when it could not be configured, so every
/// send surfaces the reason as an error bubble.
struct UnavailableSender {
    api_key_env: String,
}

impl AiSender for UnavailableSender {
    fn stream(
        &self,
        _input: &str,
        _attachments: &[PathBuf],
        _on_fragment: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<String, SendError> {
        Err(SendError::MissingApiKey(self.api_key_env.clone()))
    }
}

pub struct App {
    hwnd: HWND,
    edit: HWND,
    config: AppConfig,
    assistant: Assistant<ChatView, ScreenshotStore<GdiCapture>>,
    ui: UiSender,
    queue: UiQueue,
    gate: VisibilityGate,
    mover: WindowMover,
    scroller: Scroller,
    scroll: i32,
    content_height: i32,
    animating: bool,
    /// Tooltip last shown on the tray icon; `None` while there is no icon.
    tray_tip: Option<String>,
}

impl App {
    pub fn new(
        hwnd: HWND,
        edit: HWND,
        config: AppConfig,
        data_dir: &Path,
    ) -> Result<Self, crate::error::AppError> {
        // HWND is not Send; the waker carries the raw handle value.
        let raw_hwnd = hwnd.0 as isize;
        let (ui, queue) = ui_channel(move || unsafe {
            let _ = PostMessageW(
                Some(HWND(raw_hwnd as *mut _)),
                DRAIN_QUEUE,
                WPARAM(0),
                LPARAM(0),
            );
        });

        let sender: Arc<dyn AiSender> = match GeminiSender::new(&config.ai) {
            Ok(sender) => Arc::new(sender),
            Err(e) => {
                warn!(error = %e, "language model client unavailable");
                Arc::new(UnavailableSender {
                    api_key_env: config.ai.api_key_env.clone(),
                })
            }
        };
        let screenshots = ScreenshotStore::new(GdiCapture, screenshots_dir(data_dir))
            .map_err(whispr_core::Error::from)?;

        let window = &config.window;
        let mover = WindowMover::new(window.frame_ms, window.animation_ms);
        let scroller = Scroller::new(window.frame_ms, window.animation_ms);

        Ok(Self {
            hwnd,
            edit,
            assistant: Assistant::new(ChatView::new(hwnd), screenshots, sender, ui.clone()),
            config,
            ui,
            queue,
            gate: VisibilityGate::new(false),
            mover,
            scroller,
            scroll: 0,
            content_height: 0,
            animating: false,
            tray_tip: None,
        })
    }

    /// Installs the global keyboard hook. Failure leaves the app usable without hotkeys.
    pub fn start_hook(&mut self) {
        let tables = HotkeyTables::from_config(&self.config.shortcuts).or_else(|e| {
            warn!(error = %e, "invalid shortcut configuration, using defaults");
            HotkeyTables::from_config(&ShortcutsConfig::default())
        });
        let tables = match tables {
            Ok(tables) => tables,
            Err(e) => {
                error!(error = %e, "default shortcuts rejected; global hotkeys disabled");
                return;
            }
        };

        let engine = HookEngine::new(
            tables,
            self.gate.clone(),
            Box::new(AsyncKeyState),
            Box::new(self.ui.clone()),
        );
        if let Err(e) = self.assistant.start_hook(Win32Pump::default, engine) {
            error!(error = %e, "global hotkeys unavailable");
        }
    }

    /// Applies everything the hook and stream threads queued.
    pub fn drain(&mut self) {
        for message in self.queue.drain() {
            match message {
                UiMessage::Stream(event) => self.assistant.apply(event),
                UiMessage::Action(action) => self.on_action(action),
            }
        }
        self.refresh_tray();
    }

    /// Runs an action from a hotkey or the tray menu.
    pub fn on_action(&mut self, action: Action) {
        debug!(?action, "hotkey");
        match action {
            Action::ToggleVisibility => self.toggle(),
            Action::MoveLeft => self.move_window(Direction::Left),
            Action::MoveRight => self.move_window(Direction::Right),
            Action::MoveUp => self.move_window(Direction::Up),
            Action::MoveDown => self.move_window(Direction::Down),
            Action::ScrollUp => self.scroll_by(-self.config.window.scroll_step),
            Action::ScrollDown => self.scroll_by(self.config.window.scroll_step),
            Action::Quit => self.request_quit(),
            Action::Screenshot => {
                if let Err(e) = self.assistant.capture_screenshot() {
                    warn!(error = %e, "screenshot capture failed");
                }
            }
            Action::Minimize => self.minimize(),
            Action::ClearChat => {
                self.assistant.clear();
                self.scroller = Scroller::new(
                    self.config.window.frame_ms,
                    self.config.window.animation_ms,
                );
                self.scroll = 0;
            }
            Action::SendWithScreenshot => {
                let text = take_edit_text(self.edit);
                self.assistant.send_with_screenshot(&text);
            }
            Action::SendWithScreenshotFix => {
                let prompt = self.config.ai.fix_prompt.clone();
                self.assistant.send_with_screenshot_fix(&prompt);
            }
        }
        self.refresh_tray();
    }

    /// Sends the input box contents with any pending screenshots.
    pub fn submit_input(&mut self) {
        let text = take_edit_text(self.edit);
        self.assistant.send_input(&text);
        self.refresh_tray();
    }

    pub fn tray_status(&self) -> TrayStatus {
        TrayStatus {
            visible: self.is_visible(),
            turn: self.assistant.state(),
            pending_screenshots: self.assistant.screenshots().pending().len(),
            chat_empty: self.assistant.chat().transcript.bubbles().is_empty(),
        }
    }

    /// Adds the tray icon. Failure leaves the app usable without it.
    pub fn add_tray(&mut self) {
        let tip = tooltip(&self.tray_status());
        match add_tray_icon(self.hwnd, &tip) {
            Ok(()) => self.tray_tip = Some(tip),
            Err(e) => warn!(error = %e, "tray icon unavailable"),
        }
    }

    fn refresh_tray(&mut self) {
        let Some(shown) = &self.tray_tip else {
            return;
        };
        let tip = tooltip(&self.tray_status());
        if *shown != tip {
            set_tray_tip(self.hwnd, &tip);
            self.tray_tip = Some(tip);
        }
    }

    pub fn is_visible(&self) -> bool {
        unsafe { IsWindowVisible(self.hwnd).as_bool() && !IsIconic(self.hwnd).as_bool() }
    }

    pub fn toggle(&mut self) {
        if self.is_visible() {
            self.hide();
        } else {
            self.show();
        }
    }

    pub fn show(&mut self) {
        unsafe {
            let command = if IsIconic(self.hwnd).as_bool() {
                SW_RESTORE
            } else {
                SW_SHOW
            };
            let _ = ShowWindow(self.hwnd, command);
            let _ = SetForegroundWindow(self.hwnd);
            let _ = SetFocus(Some(self.edit));
        }
        self.gate.set_visible(true);
    }

    pub fn hide(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
        self.gate.set_visible(false);
    }

    fn minimize(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_MINIMIZE);
        }
        self.gate.set_visible(false);
    }

    fn request_quit(&self) {
        unsafe {
            let _ = PostMessageW(Some(self.hwnd), WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }

    fn move_window(&mut self, direction: Direction) {
        let Some(area) = work_area(self.hwnd) else {
            warn!("work area unavailable, move ignored");
            return;
        };
        let mut rect = RECT::default();
        if let Err(e) = unsafe { GetWindowRect(self.hwnd, &mut rect) } {
            warn!(error = %e, "GetWindowRect failed");
            return;
        }

        let window = &self.config.window;
        let geometry = MoveGeometry::new(area, window.edge_margin, window.move_divisor);
        let current = Point::new(rect.left, rect.top);
        let size = (rect.right - rect.left, rect.bottom - rect.top);
        if self
            .mover
            .request(direction, current, size, &geometry)
            .is_some()
        {
            self.start_animation();
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        let max = self.max_scroll();
        self.scroller.scroll_by(self.scroll, delta, max);
        self.start_animation();
    }

    /// Scrolls by whole mouse-wheel notches.
    pub fn on_wheel(&mut self, notches: i32) {
        self.scroll_by(-notches * self.config.window.scroll_step);
    }

    fn start_animation(&mut self) {
        if !self.animating {
            unsafe {
                SetTimer(
                    Some(self.hwnd),
                    TIMER_ANIMATION,
                    self.config.window.frame_ms,
                    None,
                );
            }
            self.animating = true;
        }
    }

    /// Advances window and scroll animations by one frame.
    pub fn tick(&mut self) {
        if let Some(frame) = self.mover.tick() {
            move_window_to(self.hwnd, frame.value);
        }
        if let Some(frame) = self.scroller.tick() {
            self.scroll = frame.value;
            invalidate(self.hwnd);
        }
        if !self.mover.is_active() && !self.scroller.is_active() {
            unsafe {
                let _ = KillTimer(Some(self.hwnd), TIMER_ANIMATION);
            }
            self.animating = false;
        }
    }

    fn chat_area(&self) -> RECT {
        let mut client = RECT::default();
        unsafe {
            let _ = GetClientRect(self.hwnd, &mut client);
        }
        RECT {
            bottom: (client.bottom - CHAT_BOTTOM_INSET).max(client.top),
            ..client
        }
    }

    fn max_scroll(&self) -> i32 {
        let area = self.chat_area();
        (self.content_height - (area.bottom - area.top)).max(0)
    }

    pub fn paint(&mut self, hdc: HDC) {
        let area = self.chat_area();
        let transcript = &self.assistant.chat().transcript;
        self.content_height = render::chat::paint(hdc, area, transcript, self.scroll);

        let max = self.max_scroll();
        let follow = std::mem::take(&mut self.assistant.chat_mut().follow);
        let target = if follow { max } else { self.scroll.min(max) };
        if target != self.scroll && !self.scroller.is_active() {
            self.scroll = target;
            invalidate(self.hwnd);
        }
    }

    /// Stops the turn in flight, removes the hook and deletes screenshots.
    pub fn shutdown(&mut self) {
        info!("shutting down");
        self.assistant.stop();
        self.assistant.clear();
        self.assistant.stop_hook();
        window::forget_edit();
    }
}

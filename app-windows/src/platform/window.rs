//! Overlay window creation and message handling.

use crate::app::App;
use crate::error::AppError;
use crate::platform::tray::{WM_TRAYICON, action_for_command, remove_tray_icon, show_tray_menu};
use crate::platform::wm::{DRAIN_QUEUE, SUBMIT_INPUT, TIMER_ANIMATION, TIMER_TOPMOST};
use crate::render::theme::{EDIT_BG_COLORREF, EDIT_TEXT_COLORREF, INPUT_HEIGHT, PADDING};
use std::mem::size_of;
use std::path::Path;
use std::sync::atomic::{AtomicIsize, Ordering};
use tracing::{info, warn};
use whispr_core::animation::{Point, Rect};
use whispr_core::config::AppConfig;
use windows::{
    Win32::{
        Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{
            BeginPaint, CreateSolidBrush, EndPaint, GetMonitorInfoW, HDC, InvalidateRect,
            MONITOR_DEFAULTTONEAREST, MONITORINFO, MonitorFromWindow, PAINTSTRUCT, SetBkColor,
            SetTextColor,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Controls::EM_SETCUEBANNER,
            Input::KeyboardAndMouse::{GetKeyState, VK_CONTROL, VK_RETURN},
            Shell::{DefSubclassProc, SetWindowSubclass},
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DispatchMessageW, GWLP_USERDATA, GetClientRect,
                GetMessageW, GetParent, GetWindowLongPtrW, GetWindowTextLengthW, GetWindowTextW,
                HTCAPTION, HTCLIENT, HWND_TOPMOST, IDC_ARROW, IsWindowVisible, LoadCursorW, MSG,
                PostMessageW, PostQuitMessage, RegisterClassW, SWP_NOACTIVATE, SWP_NOMOVE,
                SWP_NOSIZE, SWP_NOZORDER, SendMessageW, SetTimer, SetWindowDisplayAffinity,
                SetWindowLongPtrW, SetWindowPos, SetWindowTextW, TranslateMessage,
                WDA_EXCLUDEFROMCAPTURE, WINDOW_EX_STYLE, WM_CHAR, WM_COMMAND, WM_CREATE,
                WM_CTLCOLOREDIT, WM_DESTROY, WM_ERASEBKGND, WM_KEYDOWN, WM_LBUTTONUP,
                WM_MOUSEWHEEL, WM_NCHITTEST, WM_PAINT, WM_RBUTTONUP, WM_SIZE, WM_TIMER,
                WNDCLASSW, WS_CHILD, WS_CLIPCHILDREN, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
                WS_TABSTOP, WS_VISIBLE,
            },
        },
    },
    core::w,
};

/// Space below the chat area reserved for the input box.
pub const CHAT_BOTTOM_INSET: i32 = INPUT_HEIGHT + 2 * PADDING;

const TOPMOST_INTERVAL_MS: u32 = 1000;
const WHEEL_DELTA: i32 = 120;

/// Input box handle, read by messages that may arrive while the App is borrowed.
static EDIT_HWND: AtomicIsize = AtomicIsize::new(0);

/// Cached brush for the input box background.
static EDIT_BG_BRUSH: AtomicIsize = AtomicIsize::new(0);

/// Creates the overlay and runs the message loop until quit.
pub fn run(config: AppConfig, data_dir: &Path) -> Result<(), AppError> {
    unsafe {
        let instance = GetModuleHandleW(None)?;
        let class_name = w!("WhisprOverlayClass");

        let wc = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: instance.into(),
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            lpszClassName: class_name,
            ..Default::default()
        };

        let atom = RegisterClassW(&wc);
        debug_assert!(atom != 0);

        // Tool window: frameless, topmost, absent from the taskbar and Alt+Tab.
        let (width, height) = (config.window.width, config.window.height);
        let hwnd = CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
            class_name,
            w!("Whispr"),
            WS_POPUP | WS_CLIPCHILDREN,
            0,
            0,
            width,
            height,
            None,
            None,
            Some(instance.into()),
            None,
        )?;

        if let Some(area) = work_area(hwnd) {
            let x = area.left + (area.width() - width) / 2;
            let y = area.top + config.window.edge_margin;
            move_window_to(hwnd, Point::new(x, y));
        }

        if let Err(e) = SetWindowDisplayAffinity(hwnd, WDA_EXCLUDEFROMCAPTURE) {
            warn!(error = %e, "could not exclude overlay from screen capture");
        }

        let edit = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            w!("EDIT"),
            w!(""),
            WS_CHILD | WS_VISIBLE | WS_TABSTOP,
            0,
            0,
            0,
            0,
            Some(hwnd),
            None,
            Some(instance.into()),
            None,
        )?;
        let _ = SetWindowSubclass(edit, Some(edit_subclass_proc), 1, 0);
        let placeholder = w!("Ask anything...");
        let _ = SendMessageW(
            edit,
            EM_SETCUEBANNER,
            Some(WPARAM(1)),
            Some(LPARAM(placeholder.as_ptr() as isize)),
        );
        EDIT_HWND.store(edit.0 as isize, Ordering::Relaxed);
        layout_edit(hwnd);

        let app = Box::new(App::new(hwnd, edit, config, data_dir)?);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(app) as isize);

        if let Some(app) = get_app(hwnd) {
            app.start_hook();
        }

        if let Some(app) = get_app(hwnd) {
            app.add_tray();
        }
        SetTimer(Some(hwnd), TIMER_TOPMOST, TOPMOST_INTERVAL_MS, None);

        if let Some(app) = get_app(hwnd) {
            app.show();
        }
        info!("overlay ready");

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        Ok(())
    }
}

/// Work area of the monitor the window is on, as a core [`Rect`].
pub fn work_area(hwnd: HWND) -> Option<Rect> {
    unsafe {
        let monitor = MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST);
        let mut info = MONITORINFO {
            cbSize: size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !GetMonitorInfoW(monitor, &mut info).as_bool() {
            return None;
        }
        let work = info.rcWork;
        Some(Rect::new(work.left, work.top, work.right, work.bottom))
    }
}

pub fn move_window_to(hwnd: HWND, position: Point) {
    unsafe {
        let _ = SetWindowPos(
            hwnd,
            None,
            position.x,
            position.y,
            0,
            0,
            SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
        );
    }
}

pub fn invalidate(hwnd: HWND) {
    unsafe {
        let _ = InvalidateRect(Some(hwnd), None, false);
    }
}

/// Returns the input box text, trimmed, and empties the box.
pub fn take_edit_text(edit: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(edit);
        if len <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(edit, &mut buffer);
        let text = String::from_utf16_lossy(&buffer[..copied.max(0) as usize]);
        let _ = SetWindowTextW(edit, w!(""));
        text.trim().to_string()
    }
}

pub fn forget_edit() {
    EDIT_HWND.store(0, Ordering::Relaxed);
}

fn layout_edit(hwnd: HWND) {
    let edit = EDIT_HWND.load(Ordering::Relaxed);
    if edit == 0 {
        return;
    }
    unsafe {
        let mut client = RECT::default();
        let _ = GetClientRect(hwnd, &mut client);
        let _ = SetWindowPos(
            HWND(edit as *mut _),
            None,
            client.left + PADDING,
            client.bottom - PADDING - INPUT_HEIGHT,
            (client.right - client.left - 2 * PADDING).max(0),
            INPUT_HEIGHT,
            SWP_NOZORDER,
        );
    }
}

fn edit_brush() -> isize {
    let mut handle = EDIT_BG_BRUSH.load(Ordering::Relaxed);
    if handle == 0 {
        handle = unsafe { CreateSolidBrush(EDIT_BG_COLORREF) }.0 as isize;
        EDIT_BG_BRUSH.store(handle, Ordering::Relaxed);
    }
    handle
}

/// Enter (without Ctrl) in the input box submits it. Ctrl+Enter belongs to
/// the global hotkey.
unsafe extern "system" fn edit_subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _uid_subclass: usize,
    _dw_ref_data: usize,
) -> LRESULT {
    unsafe {
        let is_return = wparam.0 as u16 == VK_RETURN.0;
        match msg {
            WM_KEYDOWN if is_return && GetKeyState(i32::from(VK_CONTROL.0)) >= 0 => {
                if let Ok(parent) = GetParent(hwnd) {
                    let _ = PostMessageW(Some(parent), SUBMIT_INPUT, WPARAM(0), LPARAM(0));
                }
                LRESULT(0)
            }
            // Swallow the character so the single-line box does not beep.
            WM_CHAR if wparam.0 == '\r' as usize => LRESULT(0),
            _ => DefSubclassProc(hwnd, msg, wparam, lparam),
        }
    }
}

/// Gets the App instance from the window's user data.
///
/// # Safety
///
/// Caller must ensure only one mutable reference exists at a time. Handlers
/// for messages that can be sent re-entrantly (`WM_SIZE`, `WM_CTLCOLOREDIT`)
/// must not call this.
unsafe fn get_app(hwnd: HWND) -> Option<&'static mut App> {
    unsafe {
        let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut App;
        if ptr.is_null() { None } else { Some(&mut *ptr) }
    }
}

extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match msg {
            WM_CREATE => LRESULT(0),
            WM_NCHITTEST => {
                // The whole chat area drags the window.
                let hit = DefWindowProcW(hwnd, msg, wparam, lparam);
                if hit.0 == HTCLIENT as isize {
                    LRESULT(HTCAPTION as isize)
                } else {
                    hit
                }
            }
            WM_ERASEBKGND => LRESULT(1),
            WM_SIZE => {
                layout_edit(hwnd);
                invalidate(hwnd);
                LRESULT(0)
            }
            WM_CTLCOLOREDIT => {
                let hdc = HDC(wparam.0 as *mut _);
                SetTextColor(hdc, EDIT_TEXT_COLORREF);
                SetBkColor(hdc, EDIT_BG_COLORREF);
                LRESULT(edit_brush())
            }
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                let hdc = BeginPaint(hwnd, &mut ps);
                if let Some(app) = get_app(hwnd) {
                    app.paint(hdc);
                }
                let _ = EndPaint(hwnd, &ps);
                LRESULT(0)
            }
            DRAIN_QUEUE => {
                if let Some(app) = get_app(hwnd) {
                    app.drain();
                }
                LRESULT(0)
            }
            SUBMIT_INPUT => {
                if let Some(app) = get_app(hwnd) {
                    app.submit_input();
                }
                LRESULT(0)
            }
            WM_TIMER => {
                match wparam.0 {
                    TIMER_TOPMOST => {
                        // Other topmost windows can cover the overlay; re-assert.
                        if IsWindowVisible(hwnd).as_bool() {
                            let _ = SetWindowPos(
                                hwnd,
                                Some(HWND_TOPMOST),
                                0,
                                0,
                                0,
                                0,
                                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                            );
                        }
                    }
                    TIMER_ANIMATION => {
                        if let Some(app) = get_app(hwnd) {
                            app.tick();
                        }
                    }
                    _ => {}
                }
                LRESULT(0)
            }
            WM_MOUSEWHEEL => {
                let delta = ((wparam.0 >> 16) & 0xFFFF) as i16 as i32;
                if let Some(app) = get_app(hwnd) {
                    app.on_wheel(delta / WHEEL_DELTA);
                }
                LRESULT(0)
            }
            WM_TRAYICON => {
                let mouse_msg = (lparam.0 & 0xFFFF) as u32;
                if mouse_msg == WM_LBUTTONUP {
                    if let Some(app) = get_app(hwnd) {
                        app.toggle();
                    }
                } else if mouse_msg == WM_RBUTTONUP {
                    // The menu runs a modal loop; the app must not stay borrowed across it.
                    let status = get_app(hwnd).map(|app| app.tray_status());
                    if let Some(status) = status {
                        show_tray_menu(hwnd, &status);
                    }
                }
                LRESULT(0)
            }
            // lparam is 0 for menu commands; control notifications carry the control.
            WM_COMMAND if lparam.0 == 0 => {
                let cmd_id = (wparam.0 & 0xFFFF) as u32;
                if let Some(action) = action_for_command(cmd_id)
                    && let Some(app) = get_app(hwnd)
                {
                    app.on_action(action);
                }
                LRESULT(0)
            }
            WM_DESTROY => {
                let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut App;
                if !ptr.is_null() {
                    SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                    let mut app = Box::from_raw(ptr);
                    app.shutdown();
                }
                remove_tray_icon(hwnd);
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}

//! Notification-area icon: a status tooltip and a menu of overlay actions.

use std::mem::size_of;
use whispr_core::hotkey::Action;
use whispr_core::stream::TurnState;
use windows::{
    Win32::{
        Foundation::{HWND, POINT},
        UI::{
            Shell::{
                NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFYICONDATAW,
                Shell_NotifyIconW,
            },
            WindowsAndMessaging::{
                AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, IDI_APPLICATION,
                LoadIconW, MENU_ITEM_FLAGS, MF_GRAYED, MF_SEPARATOR, MF_STRING,
                SetForegroundWindow, TPM_BOTTOMALIGN, TPM_LEFTALIGN, TPM_RIGHTBUTTON,
                TrackPopupMenu, WM_USER,
            },
        },
    },
    core::{HSTRING, PCWSTR, Result},
};

/// Callback message for icon clicks.
pub const WM_TRAYICON: u32 = WM_USER + 1;

const TRAY_ICON_ID: u32 = 1;

/// Menu command ids are this plus the action's position in [`Action::ALL`].
const COMMAND_BASE: u32 = 1000;

/// What the icon reflects. Snapshotted from the app before the menu opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrayStatus {
    pub visible: bool,
    pub turn: TurnState,
    pub pending_screenshots: usize,
    pub chat_empty: bool,
}

pub fn command_id(action: Action) -> u32 {
    let index = Action::ALL.iter().position(|a| *a == action).unwrap_or(0);
    COMMAND_BASE + index as u32
}

pub fn action_for_command(id: u32) -> Option<Action> {
    let index = id.checked_sub(COMMAND_BASE)?;
    Action::ALL.get(index as usize).copied()
}

pub fn tooltip(status: &TrayStatus) -> String {
    let turn = match status.turn {
        TurnState::Idle => "idle",
        TurnState::Dispatching => "waiting for reply",
        TurnState::Streaming => "replying",
    };
    match status.pending_screenshots {
        0 => format!("Whispr: {turn}"),
        1 => format!("Whispr: {turn}, 1 screenshot queued"),
        n => format!("Whispr: {turn}, {n} screenshots queued"),
    }
}

/// One entry of the context menu; `None` is a separator.
#[derive(Debug, PartialEq, Eq)]
struct MenuEntry {
    action: Action,
    label: String,
    enabled: bool,
}

fn menu_entries(status: &TrayStatus) -> Vec<Option<MenuEntry>> {
    let toggle = if status.visible {
        "Hide Whispr"
    } else {
        "Show Whispr"
    };
    let screenshot = match status.pending_screenshots {
        0 => "Capture screenshot".to_string(),
        n => format!("Capture screenshot ({n} queued)"),
    };
    vec![
        Some(MenuEntry {
            action: Action::ToggleVisibility,
            label: toggle.to_string(),
            enabled: true,
        }),
        Some(MenuEntry {
            action: Action::Screenshot,
            label: screenshot,
            enabled: true,
        }),
        Some(MenuEntry {
            action: Action::ClearChat,
            label: "Clear chat".to_string(),
            enabled: !status.chat_empty || status.turn != TurnState::Idle,
        }),
        None,
        Some(MenuEntry {
            action: Action::Quit,
            label: "Quit Whispr".to_string(),
            enabled: true,
        }),
    ]
}

fn copy_tip(nid: &mut NOTIFYICONDATAW, tip: &str) {
    let max = nid.szTip.len() - 1;
    for (slot, c) in nid.szTip.iter_mut().zip(tip.encode_utf16().take(max)) {
        *slot = c;
    }
}

pub fn add_tray_icon(hwnd: HWND, tip: &str) -> Result<()> {
    unsafe {
        let mut nid = NOTIFYICONDATAW {
            cbSize: size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: TRAY_ICON_ID,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
            uCallbackMessage: WM_TRAYICON,
            hIcon: LoadIconW(None, IDI_APPLICATION)?,
            ..Default::default()
        };
        copy_tip(&mut nid, tip);

        if Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
            Ok(())
        } else {
            Err(windows::core::Error::from_thread())
        }
    }
}

pub fn set_tray_tip(hwnd: HWND, tip: &str) {
    let mut nid = NOTIFYICONDATAW {
        cbSize: size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ICON_ID,
        uFlags: NIF_TIP,
        ..Default::default()
    };
    copy_tip(&mut nid, tip);
    unsafe {
        let _ = Shell_NotifyIconW(NIM_MODIFY, &nid);
    }
}

pub fn remove_tray_icon(hwnd: HWND) {
    let nid = NOTIFYICONDATAW {
        cbSize: size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ICON_ID,
        ..Default::default()
    };
    unsafe {
        let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
    }
}

/// Shows the action menu at the cursor. The choice arrives as `WM_COMMAND`.
pub fn show_tray_menu(hwnd: HWND, status: &TrayStatus) {
    unsafe {
        let Ok(hmenu) = CreatePopupMenu() else {
            return;
        };

        for entry in menu_entries(status) {
            match entry {
                Some(entry) => {
                    let flags: MENU_ITEM_FLAGS = if entry.enabled {
                        MF_STRING
                    } else {
                        MF_STRING | MF_GRAYED
                    };
                    let label = HSTRING::from(entry.label.as_str());
                    let _ = AppendMenuW(
                        hmenu,
                        flags,
                        command_id(entry.action) as usize,
                        PCWSTR(label.as_ptr()),
                    );
                }
                None => {
                    let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, None);
                }
            }
        }

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);

        // Without this the menu does not dismiss on an outside click.
        let _ = SetForegroundWindow(hwnd);

        let _ = TrackPopupMenu(
            hmenu,
            TPM_LEFTALIGN | TPM_BOTTOMALIGN | TPM_RIGHTBUTTON,
            pt.x,
            pt.y,
            None,
            hwnd,
            None,
        );

        let _ = DestroyMenu(hmenu);
    }
}

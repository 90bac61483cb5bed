//! Chat transcript painting.

use super::theme::{
    BUBBLE_MAX_WIDTH_PERCENT, BUBBLE_PADDING, BUBBLE_RADIUS, COLOR_ASSISTANT_BUBBLE, COLOR_BG,
    COLOR_ERROR_BUBBLE, COLOR_MUTED, COLOR_TEXT, COLOR_USER_BUBBLE, PADDING,
};
use whispr_core::chat::{Bubble, BubbleState, Role, Transcript};
use windows::Win32::{
    Foundation::{COLORREF, RECT},
    Graphics::Gdi::{
        CreateSolidBrush, DEFAULT_GUI_FONT, DT_CALCRECT, DT_NOPREFIX, DT_WORDBREAK, DeleteObject,
        DrawTextW, FillRect, GetStockObject, HDC, IntersectClipRect, NULL_PEN, RestoreDC,
        RoundRect, SaveDC, SelectObject, SetBkMode, SetTextColor, TRANSPARENT,
    },
};

const LOADING_TEXT: &str = "Thinking...";

/// Paints `transcript` into `area`, shifted up by `scroll` pixels.
///
/// Returns the full content height so the caller can clamp scrolling.
pub fn paint(hdc: HDC, area: RECT, transcript: &Transcript, scroll: i32) -> i32 {
    unsafe {
        let background = CreateSolidBrush(COLOR_BG);
        FillRect(hdc, &area, background);
        let _ = DeleteObject(background.into());

        let saved = SaveDC(hdc);
        IntersectClipRect(hdc, area.left, area.top, area.right, area.bottom);
        SelectObject(hdc, GetStockObject(DEFAULT_GUI_FONT));
        SelectObject(hdc, GetStockObject(NULL_PEN));
        SetBkMode(hdc, TRANSPARENT);

        let area_width = area.right - area.left;
        let max_text_width =
            (area_width - 2 * PADDING) * BUBBLE_MAX_WIDTH_PERCENT / 100 - 2 * BUBBLE_PADDING;

        let mut y = PADDING;
        for bubble in transcript.bubbles() {
            // A streaming bubble with no text yet is still shown as loading.
            if bubble.state == BubbleState::Streaming && bubble.text.is_empty() {
                continue;
            }
            y += paint_bubble(hdc, area, bubble, max_text_width, y - scroll) + PADDING;
        }

        if transcript.is_loading() {
            let mut text: Vec<u16> = LOADING_TEXT.encode_utf16().collect();
            let mut rect = RECT {
                left: area.left + PADDING,
                top: area.top + y - scroll,
                right: area.right - PADDING,
                bottom: area.top + y - scroll + 20,
            };
            SetTextColor(hdc, COLOR_MUTED);
            DrawTextW(hdc, &mut text, &mut rect, DT_NOPREFIX);
            y += 20 + PADDING;
        }

        let _ = RestoreDC(hdc, saved);
        y
    }
}

/// Paints one bubble with its top edge at `top` (relative to `area`). Returns its height.
fn paint_bubble(hdc: HDC, area: RECT, bubble: &Bubble, max_text_width: i32, top: i32) -> i32 {
    let mut text: Vec<u16> = bubble.text.encode_utf16().collect();
    unsafe {
        let mut measure = RECT {
            left: 0,
            top: 0,
            right: max_text_width.max(1),
            bottom: 0,
        };
        DrawTextW(
            hdc,
            &mut text,
            &mut measure,
            DT_CALCRECT | DT_WORDBREAK | DT_NOPREFIX,
        );
        let text_width = measure.right - measure.left;
        let text_height = measure.bottom - measure.top;
        let width = text_width + 2 * BUBBLE_PADDING;
        let height = text_height + 2 * BUBBLE_PADDING;

        let left = match bubble.role {
            Role::User => area.right - PADDING - width,
            Role::Assistant => area.left + PADDING,
        };
        let top = area.top + top;

        let fill = CreateSolidBrush(bubble_color(bubble));
        let previous = SelectObject(hdc, fill.into());
        let _ = RoundRect(
            hdc,
            left,
            top,
            left + width,
            top + height,
            BUBBLE_RADIUS,
            BUBBLE_RADIUS,
        );
        SelectObject(hdc, previous);
        let _ = DeleteObject(fill.into());

        let mut rect = RECT {
            left: left + BUBBLE_PADDING,
            top: top + BUBBLE_PADDING,
            right: left + BUBBLE_PADDING + text_width,
            bottom: top + BUBBLE_PADDING + text_height,
        };
        SetTextColor(hdc, COLOR_TEXT);
        DrawTextW(hdc, &mut text, &mut rect, DT_WORDBREAK | DT_NOPREFIX);

        height
    }
}

fn bubble_color(bubble: &Bubble) -> COLORREF {
    match (bubble.role, bubble.state) {
        (_, BubbleState::Error) => COLOR_ERROR_BUBBLE,
        (Role::User, _) => COLOR_USER_BUBBLE,
        (Role::Assistant, _) => COLOR_ASSISTANT_BUBBLE,
    }
}

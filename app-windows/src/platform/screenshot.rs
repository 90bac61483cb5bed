//! Primary-display capture through GDI.

use image::{ImageFormat, RgbaImage};
use std::mem::size_of;
use std::path::Path;
use whispr_core::CaptureError;
use whispr_core::screenshot::CaptureBackend;
use windows::Win32::{
    Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
        DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, ReleaseDC, SRCCOPY,
        SelectObject,
    },
    UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN},
};

/// Copies the primary display with `BitBlt` and writes it out as PNG.
pub struct GdiCapture;

impl CaptureBackend for GdiCapture {
    fn capture_to(&mut self, path: &Path) -> Result<(), CaptureError> {
        let (width, height, pixels) = grab_primary_display()?;
        let image = RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| CaptureError::Encode("pixel buffer size mismatch".to_string()))?;
        image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))
    }
}

/// Returns the display as tightly packed RGBA rows, top row first.
fn grab_primary_display() -> Result<(u32, u32, Vec<u8>), CaptureError> {
    unsafe {
        let width = GetSystemMetrics(SM_CXSCREEN);
        let height = GetSystemMetrics(SM_CYSCREEN);
        if width <= 0 || height <= 0 {
            return Err(CaptureError::Platform("no primary display".to_string()));
        }

        let screen = GetDC(None);
        if screen.is_invalid() {
            return Err(CaptureError::Platform("GetDC failed".to_string()));
        }
        let memory = CreateCompatibleDC(Some(screen));
        let bitmap = CreateCompatibleBitmap(screen, width, height);
        let previous = SelectObject(memory, bitmap.into());

        let blit = BitBlt(memory, 0, 0, width, height, Some(screen), 0, 0, SRCCOPY);

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height asks for a top-down bitmap.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        let lines = GetDIBits(
            memory,
            bitmap,
            0,
            height as u32,
            Some(pixels.as_mut_ptr().cast()),
            &mut info,
            DIB_RGB_COLORS,
        );

        SelectObject(memory, previous);
        let _ = DeleteObject(bitmap.into());
        let _ = DeleteDC(memory);
        ReleaseDC(None, screen);

        blit.map_err(|e| CaptureError::Platform(format!("BitBlt failed: {e}")))?;
        if lines == 0 {
            return Err(CaptureError::Platform("GetDIBits failed".to_string()));
        }

        // GDI hands back BGRX.
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
            pixel[3] = u8::MAX;
        }
        Ok((width as u32, height as u32, pixels))
    }
}

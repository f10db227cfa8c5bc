//! Notification-area icon showing the current desktop number.

use crate::error::AppError;
use crate::tray_number::{
    base_icon, compose_number, layout_for, to_tray_size, NumberLayout, CANVAS_SIZE, NUMBER_COLOR,
};
use crate::utils::{copy_wide, wide};
use image::{GrayImage, Luma, RgbaImage};
use log::{debug, warn};
use std::ffi::c_void;
use std::ptr::null_mut;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, POINT, TRUE};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::UI::Shell::*;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Callback message the shell posts for mouse activity on the icon.
pub const WM_TRAYICON: u32 = WM_USER + 1;

const TRAY_ID: u32 = 1;
const MENU_SETTINGS_ID: usize = 1001;
const MENU_EXIT_ID: usize = 1002;
const FONT_FACE: &str = "Segoe UI";

/// What the user picked from the tray context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuChoice {
    Settings,
    Exit,
}

/// The tray icon owned by the shell window. Dropping it removes the icon.
pub struct TrayIcon {
    hwnd: HWND,
    tooltip: String,
    icon: HICON,
}

fn notify_data(hwnd: HWND) -> NOTIFYICONDATAW {
    NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ID,
        ..Default::default()
    }
}

impl TrayIcon {
    /// Adds the icon, initially the plain tile without a number.
    pub fn add(hwnd: HWND, tooltip: &str) -> Result<Self, AppError> {
        let icon = icon_from_rgba(&to_tray_size(&base_icon()))?;
        let tray = TrayIcon {
            hwnd,
            tooltip: tooltip.to_string(),
            icon,
        };
        tray.register()?;
        Ok(tray)
    }

    fn register(&self) -> Result<(), AppError> {
        let mut nid = notify_data(self.hwnd);
        nid.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
        nid.uCallbackMessage = WM_TRAYICON;
        nid.hIcon = self.icon;
        copy_wide(&mut nid.szTip, &self.tooltip);
        unsafe {
            if Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                Ok(())
            } else {
                Err(AppError::Os("Shell_NotifyIconW(NIM_ADD) failed".into()))
            }
        }
    }

    /// Adds the icon again after Explorer restarted and dropped it.
    pub fn restore(&self) {
        debug!("Re-adding tray icon after taskbar restart");
        if let Err(e) = self.register() {
            warn!("Failed to re-add tray icon: {}", e);
        }
    }

    /// Redraws the icon with `number` (1-based) and updates the tooltip.
    pub fn show_number(&mut self, number: usize) {
        let icon = match render_number_icon(number) {
            Ok(icon) => icon,
            Err(e) => {
                warn!("Failed to render tray number {}: {}", number, e);
                return;
            }
        };

        let mut nid = notify_data(self.hwnd);
        nid.uFlags = NIF_ICON | NIF_TIP;
        nid.hIcon = icon;
        copy_wide(&mut nid.szTip, &format!("{} - Desktop {}", self.tooltip, number));
        unsafe {
            if !Shell_NotifyIconW(NIM_MODIFY, &nid).as_bool() {
                warn!("Failed to update tray icon to desktop {}", number);
                let _ = DestroyIcon(icon);
                return;
            }
            let _ = DestroyIcon(self.icon);
        }
        self.icon = icon;
        debug!("Tray icon shows desktop {}", number);
    }

    /// Shows a warning balloon next to the icon.
    pub fn notify(&self, title: &str, text: &str) {
        let mut nid = notify_data(self.hwnd);
        nid.uFlags = NIF_INFO;
        nid.dwInfoFlags = NIIF_WARNING;
        copy_wide(&mut nid.szInfoTitle, title);
        copy_wide(&mut nid.szInfo, text);
        unsafe {
            if !Shell_NotifyIconW(NIM_MODIFY, &nid).as_bool() {
                warn!("Failed to show tray notification '{}'", title);
            }
        }
    }
}

impl Drop for TrayIcon {
    fn drop(&mut self) {
        let nid = notify_data(self.hwnd);
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
            let _ = DestroyIcon(self.icon);
        }
    }
}

/// Runs the Settings/Exit popup menu at the cursor and returns the choice.
///
/// The menu is modal; call it without holding any shell state borrowed.
pub fn show_menu(hwnd: HWND) -> Option<TrayMenuChoice> {
    unsafe {
        let menu = match CreatePopupMenu() {
            Ok(menu) => menu,
            Err(e) => {
                warn!("Failed to create tray menu: {}", e);
                return None;
            }
        };
        let settings = wide("Settings");
        let exit = wide("Exit");
        let _ = AppendMenuW(menu, MF_STRING, MENU_SETTINGS_ID, PCWSTR(settings.as_ptr()));
        let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
        let _ = AppendMenuW(menu, MF_STRING, MENU_EXIT_ID, PCWSTR(exit.as_ptr()));

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);
        // Without this the menu does not close when the user clicks elsewhere.
        let _ = SetForegroundWindow(hwnd);
        let picked = TrackPopupMenu(
            menu,
            TPM_RIGHTBUTTON | TPM_RETURNCMD | TPM_NONOTIFY,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );
        let _ = DestroyMenu(menu);

        match picked.0 as usize {
            MENU_SETTINGS_ID => Some(TrayMenuChoice::Settings),
            MENU_EXIT_ID => Some(TrayMenuChoice::Exit),
            _ => None,
        }
    }
}

fn render_number_icon(number: usize) -> Result<HICON, AppError> {
    let layout = layout_for(number);
    let coverage = rasterize_text(&layout)?;
    let composed = compose_number(&base_icon(), &coverage, NUMBER_COLOR);
    icon_from_rgba(&to_tray_size(&composed))
}

fn bitmap_info(width: u32, height: u32) -> BITMAPINFO {
    BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width as i32,
            // Negative height: rows run top to bottom.
            biHeight: -(height as i32),
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Memory DC with a 32bpp DIB and a font selected. Restores and frees
/// every GDI object on drop.
struct TextCanvas {
    dc: HDC,
    bitmap: HBITMAP,
    font: HFONT,
    old_bitmap: HGDIOBJ,
    old_font: HGDIOBJ,
    bits: *mut c_void,
}

impl TextCanvas {
    fn new(size: u32, layout: &NumberLayout) -> Result<Self, AppError> {
        unsafe {
            let dc = CreateCompatibleDC(None);
            if dc.is_invalid() {
                return Err(AppError::Os("CreateCompatibleDC failed".into()));
            }
            let mut bits: *mut c_void = null_mut();
            let bitmap =
                match CreateDIBSection(dc, &bitmap_info(size, size), DIB_RGB_COLORS, &mut bits, None, 0) {
                    Ok(bitmap) => bitmap,
                    Err(e) => {
                        let _ = DeleteDC(dc);
                        return Err(e.into());
                    }
                };

            let mut logfont = LOGFONTW {
                lfHeight: -layout.font_height,
                lfWeight: 700,
                lfQuality: ANTIALIASED_QUALITY,
                ..Default::default()
            };
            copy_wide(&mut logfont.lfFaceName, FONT_FACE);
            let font = CreateFontIndirectW(&logfont);

            let old_bitmap = SelectObject(dc, bitmap);
            let old_font = SelectObject(dc, font);
            Ok(TextCanvas {
                dc,
                bitmap,
                font,
                old_bitmap,
                old_font,
                bits,
            })
        }
    }
}

impl Drop for TextCanvas {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.dc, self.old_font);
            SelectObject(self.dc, self.old_bitmap);
            let _ = DeleteObject(self.font);
            let _ = DeleteObject(self.bitmap);
            let _ = DeleteDC(self.dc);
        }
    }
}

/// Draws the layout's text in white on black and returns the coverage mask.
fn rasterize_text(layout: &NumberLayout) -> Result<GrayImage, AppError> {
    let canvas = TextCanvas::new(CANVAS_SIZE, layout)?;
    let text: Vec<u16> = layout.text.encode_utf16().collect();
    let (x, y) = layout.origin;
    unsafe {
        SetBkMode(canvas.dc, TRANSPARENT);
        SetTextColor(canvas.dc, COLORREF(0x00FF_FFFF));
        if !TextOutW(canvas.dc, x, y, &text).as_bool() {
            return Err(AppError::Os(format!("TextOutW failed for '{}'", layout.text)));
        }
        let _ = GdiFlush();

        let len = (CANVAS_SIZE * CANVAS_SIZE * 4) as usize;
        let pixels = std::slice::from_raw_parts(canvas.bits as *const u8, len);
        Ok(GrayImage::from_fn(CANVAS_SIZE, CANVAS_SIZE, |px, py| {
            let offset = ((py * CANVAS_SIZE + px) * 4) as usize;
            // BGRA; text is white so any channel carries the coverage.
            Luma([pixels[offset + 2]])
        }))
    }
}

fn icon_from_rgba(image: &RgbaImage) -> Result<HICON, AppError> {
    let (width, height) = image.dimensions();
    unsafe {
        let mut bits: *mut c_void = null_mut();
        let color = CreateDIBSection(
            None,
            &bitmap_info(width, height),
            DIB_RGB_COLORS,
            &mut bits,
            None,
            0,
        )?;
        let dest = std::slice::from_raw_parts_mut(bits as *mut u8, (width * height * 4) as usize);
        for (i, pixel) in image.pixels().enumerate() {
            let [r, g, b, a] = pixel.0;
            dest[i * 4..i * 4 + 4].copy_from_slice(&[b, g, r, a]);
        }

        let mask = CreateBitmap(width as i32, height as i32, 1, 1, None);
        let info = ICONINFO {
            fIcon: TRUE,
            xHotspot: 0,
            yHotspot: 0,
            hbmMask: mask,
            hbmColor: color,
        };
        let icon = CreateIconIndirect(&info);
        let _ = DeleteObject(color);
        let _ = DeleteObject(mask);
        Ok(icon?)
    }
}

use crate::desktop_tracker::{WindowFocus, WindowHandle};
use log::{debug, info, warn};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Retrieves the **currently active window** (foreground window) along with its **title**.
///
/// # Behavior
/// - Calls the Win32 API function [`GetForegroundWindow`](https://learn.microsoft.com/en-us/windows/win32/api/winuser/nf-winuser-getforegroundwindow)
///   to get a handle (`HWND`) to the active window.
/// - If the handle is non-null, retrieves the window's title via
///   [`GetWindowTextW`](https://learn.microsoft.com/en-us/windows/win32/api/winuser/nf-winuser-getwindowtextw).
/// - Returns `Some((HWND, String))`, or `None` if no window has focus (e.g. while
///   the desktop itself is focused during a switch).
///
/// # Notes
/// - The title is capped at 256 UTF-16 units; it is only used for logging.
pub fn get_active_window() -> Option<(HWND, String)> {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0.is_null() {
            debug!("No active window detected.");
            None
        } else {
            let mut buffer = [0u16; 256];
            let length = GetWindowTextW(hwnd, &mut buffer);
            let title = String::from_utf16_lossy(&buffer[..length as usize]);
            debug!("Active window detected: '{}'.", title);
            Some((hwnd, title))
        }
    }
}

/// Brings `hwnd` to the foreground, restoring it first if it is minimized.
///
/// # Behavior
/// - Skips handles that no longer refer to a window (`IsWindow` is false); the
///   window may have been closed since it was remembered.
/// - Restores iconic windows with `SW_RESTORE` so the focused window is visible.
/// - Calls `SetForegroundWindow`. Windows may refuse the request (focus-stealing
///   rules); the refusal is logged and otherwise ignored.
pub fn activate_window(hwnd: HWND) {
    unsafe {
        if !IsWindow(hwnd).as_bool() {
            warn!("Remembered window {:?} no longer exists.", hwnd);
            return;
        }

        if IsIconic(hwnd).as_bool() {
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }

        if SetForegroundWindow(hwnd).as_bool() {
            info!("Activated window {:?}", hwnd);
        } else {
            warn!("Failed to activate window {:?}", hwnd);
        }
    }
}

/// Foreground window access through the Win32 API.
#[derive(Default)]
pub struct Win32Focus;

impl WindowFocus for Win32Focus {
    fn foreground(&self) -> Option<WindowHandle> {
        get_active_window().map(|(hwnd, _)| WindowHandle(hwnd.0 as isize))
    }

    fn activate(&mut self, window: WindowHandle) {
        activate_window(HWND(window.0 as *mut std::ffi::c_void));
    }
}

use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Null-terminated UTF-16 copy of `s` for Win32 string parameters.
pub fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

/// Copy `s` into a fixed-size UTF-16 field, truncating and always leaving a
/// terminating null.
pub fn copy_wide(dest: &mut [u16], s: &str) {
    let src = wide(s);
    let len = src.len().min(dest.len());
    dest[..len].copy_from_slice(&src[..len]);
    if let Some(last) = dest.last_mut() {
        if len == dest.len() {
            *last = 0;
        }
    }
}

fn message_box(message: &str, title: &str, style: MESSAGEBOX_STYLE) {
    let message = wide(message);
    let title = wide(title);
    unsafe {
        MessageBoxW(
            HWND(std::ptr::null_mut()),
            PCWSTR(message.as_ptr()),
            PCWSTR(title.as_ptr()),
            style,
        );
    }
}

/// Display a simple informational message box with an "OK" button.
pub fn show_message_box(message: &str, title: &str) {
    message_box(message, title, MB_OK | MB_ICONINFORMATION);
}

/// Like [`show_message_box`] with the red error icon.
pub fn show_error_box(message: &str, title: &str) {
    message_box(message, title, MB_OK | MB_ICONERROR);
}

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static IMAGE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png|bmp|gif|tiff?|jfif)$").expect("valid image pattern"));

/// Something that can change the desktop wallpaper. Failures are the
/// implementation's business; callers never check them.
pub trait WallpaperSetter {
    fn set_wallpaper(&mut self, path: &str);
}

/// Pick the wallpaper for the desktop at `ordinal`: `list[ordinal % len]`,
/// or `None` when the list is empty.
pub fn select_wallpaper(list: &[String], ordinal: usize) -> Option<&str> {
    if list.is_empty() {
        None
    } else {
        Some(list[ordinal % list.len()].as_str())
    }
}

/// Whether `path` has an extension Windows accepts as a wallpaper.
pub fn is_supported_image(path: &str) -> bool {
    IMAGE_FILE.is_match(path)
}

/// Extensions offered by the "Add background" file dialog.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jfif", "png", "bmp", "gif", "tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// The one selected index, or `None` for an empty or multiple selection.
pub fn single_selection(selected: &BTreeSet<usize>) -> Option<usize> {
    if selected.len() == 1 {
        selected.iter().next().copied()
    } else {
        None
    }
}

/// Move the entry at `index` one step. Returns its new index, or `None`
/// when it is already at that end of the list.
pub fn move_wallpaper(list: &mut [String], index: usize, direction: MoveDirection) -> Option<usize> {
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => index + 1,
    };
    if index >= list.len() || target >= list.len() {
        return None;
    }
    list.swap(index, target);
    Some(target)
}

/// Remove every selected entry; out-of-range indices are ignored.
pub fn remove_wallpapers(list: &mut Vec<String>, selected: &BTreeSet<usize>) {
    for &index in selected.iter().rev() {
        if index < list.len() {
            list.remove(index);
        }
    }
}

#[cfg(target_os = "windows")]
pub use self::win32::SystemWallpaper;

#[cfg(target_os = "windows")]
mod win32 {
    use super::WallpaperSetter;
    use log::{info, warn};
    use windows::Win32::UI::WindowsAndMessaging::{
        SystemParametersInfoW, SPIF_SENDWININICHANGE, SPIF_UPDATEINIFILE, SPI_SETDESKWALLPAPER,
    };

    /// Sets the wallpaper through `SystemParametersInfoW`.
    #[derive(Default)]
    pub struct SystemWallpaper;

    impl WallpaperSetter for SystemWallpaper {
        fn set_wallpaper(&mut self, path: &str) {
            let mut wide: Vec<u16> = path.encode_utf16().chain(Some(0)).collect();
            let result = unsafe {
                SystemParametersInfoW(
                    SPI_SETDESKWALLPAPER,
                    0,
                    Some(wide.as_mut_ptr() as *mut _),
                    SPIF_UPDATEINIFILE | SPIF_SENDWININICHANGE,
                )
            };
            match result {
                Ok(()) => info!("Wallpaper set to '{}'", path),
                Err(e) => warn!("Failed to set wallpaper '{}': {}", path, e),
            }
        }
    }
}

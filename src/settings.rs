use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Persisted user configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Use Shift+Alt instead of Ctrl+Alt for the navigation hotkeys.
    #[serde(default)]
    pub use_alternate_hotkeys: bool,
    /// Wallpaper files, applied to desktops by ordinal modulo list length.
    #[serde(default)]
    pub wallpapers: Vec<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Keep remembered focus for surviving desktops when one is added or
    /// removed. Off by default: every remembered window is forgotten.
    #[serde(default = "default_keep_focus")]
    pub keep_focus_on_desktop_change: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_keep_focus() -> bool {
    false
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_alternate_hotkeys: false,
            wallpapers: Vec::new(),
            log_level: default_log_level(),
            keep_focus_on_desktop_change: default_keep_focus(),
        }
    }
}

/// Load settings from `path`. A missing file yields the defaults; a file
/// that cannot be read or parsed is an error, and callers fall back to
/// [`Settings::default`] after reporting it.
pub fn load_settings(path: &str) -> Result<Settings, AppError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(serde_json::from_str::<Settings>(&content)?)
}

pub fn save_settings(path: &str, settings: &Settings) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(settings)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

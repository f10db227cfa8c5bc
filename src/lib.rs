//! Cycle Windows virtual desktops from the system tray.
//!
//! The desktop tracker, hotkey model, wallpaper selection and tray-number
//! layout are platform independent and reach the OS only through traits.
//! The Win32 adapters, the shell thread and the settings window are
//! compiled on Windows only.

pub mod cli;
pub mod controller;
pub mod desktop_tracker;
pub mod error;
pub mod hotkey;
pub mod logging;
pub mod settings;
pub mod tray_number;
pub mod wallpaper;

#[cfg(target_os = "windows")]
pub mod gui;
#[cfg(target_os = "windows")]
pub mod shell;
#[cfg(target_os = "windows")]
pub mod tray;
#[cfg(target_os = "windows")]
pub mod utils;
#[cfg(target_os = "windows")]
pub mod virtual_desktop;
#[cfg(target_os = "windows")]
pub mod window_manager;

#![windows_subsystem = "windows"]

use clap::Parser;
use desktop_cycle::cli::CliArgs;
use desktop_cycle::desktop_tracker::DesktopHost;
use desktop_cycle::error::AppError;
use desktop_cycle::gui::{self, SettingsApp};
use desktop_cycle::logging::ensure_logging_initialized;
use desktop_cycle::settings::{load_settings, Settings};
use desktop_cycle::shell::{self, APP_NAME};
use desktop_cycle::utils::{show_error_box, show_message_box};
use desktop_cycle::virtual_desktop::{describe_desktops, WinVirtualDesktops};
use log::{error, info, warn};
use std::env;

/// The entry point for Desktop Cycle.
///
/// # Behavior
/// - Loads the settings file named on the command line and initializes
///   logging at the settings' level (or `--log-level`). An unreadable
///   settings file is logged once the logger exists, and defaults are used.
/// - `--list-desktops` and `--switch-to` run once and exit.
/// - Otherwise starts the shell thread (tray icon, hotkeys, desktop events)
///   and runs the settings window on this thread.
///
/// # Notes
/// - The Windows subsystem is `"windows"`, so there is no console; the
///   one-shot modes report through a message box and the log file.
/// - The process ends from the tray's "Exit" entry. If the settings window
///   cannot be created the tray keeps running without it.
fn main() {
    let args = CliArgs::parse();
    let (settings, settings_error) = match load_settings(&args.settings) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let level = args.log_level.clone().unwrap_or_else(|| settings.log_level.clone());
    ensure_logging_initialized(&level);

    if let Some(e) = settings_error {
        warn!("Ignoring settings file '{}', using defaults: {}", args.settings, e);
    }

    // Backtrace for Debug
    env::set_var("RUST_BACKTRACE", "1");

    info!("Starting {}...", APP_NAME);

    if args.list_desktops {
        list_desktops();
        return;
    }

    if let Some(number) = args.switch_to {
        if let Err(e) = switch_to(number as usize) {
            error!("Failed to switch to desktop {}: {}", number, e);
            show_error_box(&e.to_string(), APP_NAME);
        }
        return;
    }

    let shell = match shell::spawn(settings.clone(), args.settings.clone()) {
        Ok(shell) => shell,
        Err(e) => {
            error!("Failed to start: {}", e);
            show_error_box(&format!("{} could not start:\n{}", APP_NAME, e), APP_NAME);
            return;
        }
    };

    let app = SettingsApp::new(shell.handle(), settings);
    if let Err(e) = gui::run_gui(app, args.show_settings) {
        error!("Settings window failed: {}", e);
    }

    shell.wait();
}

fn list_desktops() {
    match describe_desktops() {
        Ok(desktops) => {
            let lines: Vec<String> = desktops
                .iter()
                .map(|(number, id, name)| {
                    let name = if name.is_empty() { "(unnamed)" } else { name.as_str() };
                    format!("{}: {} [{:032x}]", number, name, id.0)
                })
                .collect();
            for line in &lines {
                info!("{}", line);
            }
            show_message_box(&lines.join("\n"), "Virtual desktops");
        }
        Err(e) => {
            error!("Failed to list desktops: {}", e);
            show_error_box(&e.to_string(), APP_NAME);
        }
    }
}

/// Switch to the 1-based desktop `number`.
fn switch_to(number: usize) -> Result<(), AppError> {
    let mut host = WinVirtualDesktops;
    let desktops = host.desktops()?;
    let target = desktops
        .get(number - 1)
        .copied()
        .ok_or_else(|| AppError::Desktop(format!("there is no desktop {}", number)))?;
    info!("Switching to desktop {}", number);
    host.switch_to(target)
}

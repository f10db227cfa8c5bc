use crate::settings::DEFAULT_SETTINGS_FILE;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle virtual desktops from the system tray", long_about = None)]
pub struct CliArgs {
    /// Settings file to load and save.
    #[arg(long = "settings", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: String,

    /// Open the settings window at start-up instead of staying in the tray.
    #[arg(long = "show-settings", action = ArgAction::SetTrue)]
    pub show_settings: bool,

    /// Override the log level from the settings file.
    #[arg(long = "log-level", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Print the desktops in order and exit.
    #[arg(long = "list-desktops", action = ArgAction::SetTrue)]
    pub list_desktops: bool,

    /// Switch to desktop N (1-based) and exit.
    #[arg(long = "switch-to", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub switch_to: Option<u32>,
}

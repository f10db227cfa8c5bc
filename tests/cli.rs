use clap::Parser;
use desktop_cycle::cli::CliArgs;

#[test]
fn defaults() {
    let args = CliArgs::parse_from(["prog"]);
    assert_eq!(args.settings, "settings.json");
    assert!(!args.show_settings);
    assert!(!args.list_desktops);
    assert_eq!(args.log_level, None);
    assert_eq!(args.switch_to, None);
}

#[test]
fn parses_settings_path() {
    let args = CliArgs::parse_from(["prog", "--settings", "other.json"]);
    assert_eq!(args.settings, "other.json");
}

#[test]
fn parses_show_settings_flag() {
    let args = CliArgs::parse_from(["prog", "--show-settings"]);
    assert!(args.show_settings);
}

#[test]
fn parses_log_level() {
    let args = CliArgs::parse_from(["prog", "--log-level", "debug"]);
    assert_eq!(args.log_level.as_deref(), Some("debug"));
}

#[test]
fn rejects_unknown_log_level() {
    assert!(CliArgs::try_parse_from(["prog", "--log-level", "loud"]).is_err());
}

#[test]
fn parses_list_desktops_flag() {
    let args = CliArgs::parse_from(["prog", "--list-desktops"]);
    assert!(args.list_desktops);
}

#[test]
fn parses_switch_to() {
    let args = CliArgs::parse_from(["prog", "--switch-to", "3"]);
    assert_eq!(args.switch_to, Some(3));
}

#[test]
fn rejects_switch_to_zero() {
    assert!(CliArgs::try_parse_from(["prog", "--switch-to", "0"]).is_err());
}

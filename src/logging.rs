use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

pub const LOG_FILE: &str = "desktop_cycle.log";
const LOG_PATTERN: &str = "{d} - {l} - {m}{n}";

/// Parses a settings or CLI level name; anything unknown means `info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn file_config(level: LevelFilter) -> Result<Config, String> {
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .append(false)
        .build(LOG_FILE)
        .map_err(|e| format!("failed to create {}: {}", LOG_FILE, e))?;

    Config::builder()
        .appender(Appender::builder().build("file", Box::new(logfile)))
        .build(Root::builder().appender("file").build(level))
        .map_err(|e| format!("failed to build log configuration: {}", e))
}

/// Initializes logging into [`LOG_FILE`] at `level`.
///
/// # Behavior
/// - Builds a `log4rs` file appender (truncating the previous log) with the
///   pattern `{d} - {l} - {m}{n}`.
/// - If the file cannot be created, falls back to `env_logger` on stderr at
///   the same level so messages are not lost.
///
/// # Notes
/// - Calling it twice leaves the first logger in place; the second attempt
///   is reported on stderr.
pub fn ensure_logging_initialized(level: &str) {
    let level = parse_level(level);
    let result = match file_config(level) {
        Ok(config) => log4rs::init_config(config).map(|_| ()).map_err(|e| e.to_string()),
        Err(e) => {
            eprintln!("File logging unavailable ({}); logging to stderr", e);
            env_logger::Builder::new()
                .filter_level(level)
                .try_init()
                .map_err(|e| e.to_string())
        }
    };

    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_levels() {
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level(" warn "), LevelFilter::Warn);
        assert_eq!(parse_level("error"), LevelFilter::Error);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("info"), LevelFilter::Info);
    }

    #[test]
    fn unknown_level_means_info() {
        assert_eq!(parse_level(""), LevelFilter::Info);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }
}

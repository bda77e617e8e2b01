//! Logging setup for pyfuze: human-readable by default, JSON lines on request

use chrono::{Local, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::json;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;

/// Environment variable selecting the log level (`info`, `debug`, `json:debug`, ...)
pub const LOG_LEVEL_ENV: &str = "PYFUZE_LOG_LEVEL";

/// Environment variable redirecting JSON log lines to a file
pub const LOG_PATH_ENV: &str = "PYFUZE_LOG_PATH";

/// JSON logger implementation
#[derive(Debug)]
pub struct JsonLogger {
    level: Level,
    target_file: Mutex<Option<std::fs::File>>,
}

/// Split `json:debug` style settings into (json?, level)
fn split_level(level_str: &str) -> (bool, &str) {
    if let Some(stripped) = level_str.strip_prefix("json:") {
        (true, stripped)
    } else if level_str == "json" {
        (true, "info")
    } else {
        (false, level_str)
    }
}

fn parse_level_filter(level: &str) -> LevelFilter {
    match level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

impl JsonLogger {
    /// Create a new JSON logger
    pub fn new(level: Level, log_path: Option<String>) -> Self {
        let target_file = if let Some(path) = log_path {
            OpenOptions::new().create(true).append(true).open(path).ok()
        } else {
            None
        };

        JsonLogger {
            level,
            target_file: Mutex::new(target_file),
        }
    }

    /// Initialize the logger with specified level; returns the effective level name
    pub fn init_with_level(level_str: &str) -> String {
        let (use_json, actual_level) = split_level(level_str);
        let level_filter = parse_level_filter(actual_level);

        if !use_json {
            let result = env_logger::Builder::new()
                .filter_level(level_filter)
                .format(|buf, record| {
                    write!(buf, "📦 ")?;
                    write!(
                        buf,
                        "[{} {} {}] ",
                        Local::now().format("%Y-%m-%dT%H:%M:%S"),
                        record.level(),
                        record.target()
                    )?;
                    writeln!(buf, "{}", record.args())
                })
                .try_init();
            if let Err(e) = result {
                eprintln!("Failed to initialize logger: {e}");
            }
            return actual_level.to_string();
        }

        let level = level_filter.to_level().unwrap_or(Level::Info);
        let logger = Box::new(JsonLogger::new(level, env::var(LOG_PATH_ENV).ok()));

        if let Err(e) = log::set_boxed_logger(logger) {
            eprintln!("Failed to initialize JSON logger: {e}");
            return actual_level.to_string();
        }

        log::set_max_level(level_filter);
        actual_level.to_string()
    }

    /// Initialize from PYFUZE_LOG_LEVEL, defaulting to `info`
    pub fn init() -> String {
        let log_level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
        Self::init_with_level(&log_level)
    }
}

impl Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let log_entry = json!({
            "@timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            "@level": record.level().to_string().to_lowercase(),
            "@message": record.args().to_string(),
            "@module": record.target(),
            "@pid": std::process::id(),
            "@file": record.file().unwrap_or("unknown"),
            "@line": record.line().unwrap_or(0),
        });

        let json_string = format!(
            "{}\n",
            serde_json::to_string(&log_entry).unwrap_or_default()
        );

        if let Ok(mut file_guard) = self.target_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let _ = file.write_all(json_string.as_bytes());
                let _ = file.flush();
                return;
            }
        }

        let _ = io::stderr().write_all(json_string.as_bytes());
        let _ = io::stderr().flush();
    }

    fn flush(&self) {
        if let Ok(mut file_guard) = self.target_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let _ = file.flush();
            }
        }
        let _ = io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_level() {
        assert_eq!(split_level("json:debug"), (true, "debug"));
        assert_eq!(split_level("json"), (true, "info"));
        assert_eq!(split_level("warn"), (false, "warn"));
    }

    #[test]
    fn test_parse_level_filter_falls_back_to_info() {
        assert_eq!(parse_level_filter("trace"), LevelFilter::Trace);
        assert_eq!(parse_level_filter("off"), LevelFilter::Off);
        assert_eq!(parse_level_filter("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_json_logger_respects_level() {
        let logger = JsonLogger::new(Level::Warn, None);
        let warn = Metadata::builder().level(Level::Warn).build();
        let debug = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }
}

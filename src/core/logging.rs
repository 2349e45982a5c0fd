//! Diagnostic logging to stderr.
//!
//! stdout carries the rendered page, so every log line goes to stderr (or
//! to `SFCOST_LOG_FILE` when set). `--json-output` switches to one JSON
//! object per event.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::util::env::non_empty_var;

const LOG_LEVEL_ENV: &str = "SFCOST_LOG";
const LOG_FORMAT_ENV: &str = "SFCOST_LOG_FORMAT";
const LOG_FILE_ENV: &str = "SFCOST_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Log level from CLI argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

impl LogLevel {
    /// Parse from CLI argument.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to tracing filter string.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Convert to tracing level.
    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

/// Parse log level from `SFCOST_LOG`.
#[must_use]
pub fn parse_log_level_from_env() -> Option<LogLevel> {
    non_empty_var(LOG_LEVEL_ENV).and_then(|v| LogLevel::from_arg(&v))
}

/// Parse log format from `SFCOST_LOG_FORMAT`.
#[must_use]
pub fn parse_log_format_from_env() -> Option<LogFormat> {
    non_empty_var(LOG_FORMAT_ENV).and_then(|v| LogFormat::from_arg(&v))
}

/// Parse log file path from `SFCOST_LOG_FILE`.
#[must_use]
pub fn parse_log_file_from_env() -> Option<PathBuf> {
    non_empty_var(LOG_FILE_ENV).map(PathBuf::from)
}

/// Filter directive for our own crate at `level`.
#[must_use]
pub fn default_directive(level: LogLevel) -> String {
    format!("sfcost={}", level.as_filter())
}

/// Initialize logging with the given settings.
///
/// `RUST_LOG`, when set, overrides the level-derived filter.
pub fn init(level: LogLevel, format: LogFormat, log_file: Option<PathBuf>, verbose: bool) {
    let level = if verbose && level == LogLevel::Error {
        LogLevel::Debug
    } else {
        level
    };

    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });

    let writer = match file {
        Some(file) => BoxMakeWriter::new(file),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    match format {
        LogFormat::Json => {
            builder
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            builder.compact().with_target(true).try_init().ok();
        }
        LogFormat::Human => {
            builder.with_target(false).without_time().try_init().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[allow(unsafe_code)]
    fn with_env_var(key: &str, value: &str, f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let prior = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        f();
        match prior {
            Some(val) => unsafe {
                std::env::set_var(key, val);
            },
            None => unsafe {
                std::env::remove_var(key);
            },
        }
    }

    #[test]
    fn env_log_level_parsing() {
        with_env_var(LOG_LEVEL_ENV, "trace", || {
            assert_eq!(parse_log_level_from_env(), Some(LogLevel::Trace));
        });

        with_env_var(LOG_LEVEL_ENV, "warn", || {
            assert_eq!(parse_log_level_from_env(), Some(LogLevel::Warn));
        });

        with_env_var(LOG_LEVEL_ENV, "  ", || {
            assert_eq!(parse_log_level_from_env(), None);
        });
    }

    #[test]
    fn env_log_format_parsing() {
        with_env_var(LOG_FORMAT_ENV, "JSON", || {
            assert_eq!(parse_log_format_from_env(), Some(LogFormat::Json));
        });
    }

    #[test]
    fn directive_targets_crate() {
        assert_eq!(default_directive(LogLevel::Debug), "sfcost=debug");
        assert_eq!(LogLevel::Warn.as_tracing_level(), Level::WARN);
    }
}

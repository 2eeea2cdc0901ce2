use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

pub const LOG_FILE_NAME: &str = "nws-alerts.log";

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingOptions {
    pub console_level: LogLevel,
    pub file_level: LogLevel,
    pub journald: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            console_level: LogLevel::Info,
            file_level: LogLevel::Debug,
            journald: false,
        }
    }
}

/// Logs to the console and to a file in `log_dir`. Keep the returned guard
/// alive until exit or buffered file output is lost.
pub fn setup_logging(opts: &LoggingOptions, log_dir: &Path) -> WorkerGuard {
    let console_level = LevelFilter::from_level(opts.console_level.into());
    let file_level = LevelFilter::from_level(opts.file_level.into());

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let journald = if opts.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_filter(console_level)),
            Err(err) => {
                eprintln!("Couldn't connect to journald: {err}");
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(console_level))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(file_level),
        )
        .with(journald)
        .init();

    guard
}

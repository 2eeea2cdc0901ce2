use chrono::Local;
use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

pub const DEFAULT_FILE_NAME: &str = "api_err_log.txt";

/// Append-only record of failures whose details are hidden from callers.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `<timestamp> - <message>` as a single line. Failing to write the
    /// log must not mask the original error, so write errors are only traced.
    pub fn record(&self, message: &str) {
        error!("{message}");
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string(), message);
        let result = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or(Ok(()), create_dir_all)
            .and_then(|_| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
            })
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            warn!("Could not write to {}: {err}", self.path.display());
        }
    }
}

// Keeps every record on one line even if the cause spans several.
fn format_line(timestamp: &str, message: &str) -> String {
    let message = message.replace(['\r', '\n'], " ");
    format!("{timestamp} - {message}\n")
}

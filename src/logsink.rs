//! Transcript of a single export: status lines plus everything the engine
//! prints, in arrival order. Lines are echoed to stderr and appended to a
//! log file so failed runs leave something to inspect.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config;

pub const LOG_FILENAME: &str = "export.log";

pub struct LogSink {
    file: File,
}

impl LogSink {
    /// Open the transcript for a fresh export, truncating the previous one.
    pub fn begin(path: &Path) -> Result<LogSink> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        log::debug!("export transcript at {}", path.display());

        let mut sink = LogSink { file };
        sink.line(&format!(
            "nbexport {} at {}",
            env!("CARGO_PKG_VERSION"),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        Ok(sink)
    }

    /// Append one line, echoing it to stderr. Transcript write failures
    /// never fail the export.
    pub fn line(&mut self, text: &str) {
        eprintln!("{}", text);
        if let Err(e) = writeln!(self.file, "{}", text) {
            log::warn!("failed to write export log line: {}", e);
        }
    }
}

pub fn default_log_path() -> Result<PathBuf> {
    Ok(config::state_dir()?.join(LOG_FILENAME))
}

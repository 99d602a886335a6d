//! Run log and console output.
//!
//! Every decision a run makes (folder created, file moved, file skipped,
//! directory removed) goes through a [`RunLog`] as one pre-formatted line.
//! Lines are printed with colors and, when saving is enabled, appended
//! without colors and with a timestamp to a log file.

use crate::error::{OrganizeError, OrganizeResult};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the saved run log. Never organized or hashed.
pub const RUN_LOG_FILE: &str = "dirsort.log";

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
    Header,
}

impl Level {
    fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Success => "OK",
            Level::Warning => "WARN",
            Level::Error => "ERROR",
            Level::Header => "----",
        }
    }
}

/// Line-oriented logger for one run.
pub struct RunLog {
    quiet: bool,
    file: Option<(PathBuf, File)>,
}

impl RunLog {
    /// Logs to the console only.
    pub fn console() -> Self {
        Self {
            quiet: false,
            file: None,
        }
    }

    /// Logs nowhere on the console. Used by library callers and tests.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            file: None,
        }
    }

    /// Also appends every line to `<output_dir>/dirsort.log`.
    pub fn save_to(mut self, output_dir: &Path) -> OrganizeResult<Self> {
        let path = output_dir.join(RUN_LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| OrganizeError::RunLogFailed {
                path: path.clone(),
                source: e,
            })?;
        self.file = Some((path, file));
        Ok(self)
    }

    /// Path of the saved log, if saving is enabled.
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.record(Level::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.record(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }

    pub fn header(&self, message: &str) {
        self.record(Level::Header, message);
    }

    /// Writes one line at the given level.
    pub fn record(&self, level: Level, message: &str) {
        if !self.quiet {
            match level {
                Level::Info => println!("{}", message.cyan()),
                Level::Success => println!("{} {}", "✓".green(), message),
                Level::Warning => println!("{} {}", "⚠".yellow(), message),
                Level::Error => eprintln!("{} {}", "✗".red(), message),
                Level::Header => println!("\n{}", message.bold()),
            }
        }

        if let Some((path, file)) = &self.file {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            let mut writer: &File = file;
            if let Err(e) = writeln!(writer, "{} [{}] {}", timestamp, level.label(), message) {
                eprintln!("Warning: Could not write run log {}: {}", path.display(), e);
            }
        }
    }

    /// Creates a progress bar, hidden when the log is quiet.
    pub fn progress_bar(&self, total: u64) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }
}

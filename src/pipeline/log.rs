//! Per-task log destination.
//!
//! A [`TaskLog`] is handed to the executor for the lifetime of one task.
//! Records are appended to the task's own log file and mirrored into
//! `tracing`, so concurrent workers never share a writer.

use chrono::Local;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Log sink for one task.
///
/// Writes are blocking `std::fs` I/O through a `BufWriter`, done on whichever
/// runtime worker records the line. A task emits a few dozen lines between
/// tool runs that last minutes, so the buffer rarely reaches the disk before
/// [`TaskLog::detach`].
pub struct TaskLog {
    task: String,
    path: Option<PathBuf>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl TaskLog {
    /// Open (append) the log file for a task
    pub fn attach(path: &Path, task: impl Into<String>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            task: task.into(),
            path: Some(path.to_path_buf()),
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// A log that only mirrors into `tracing`
    pub fn discard(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            path: None,
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn debug(&self, message: impl Display) {
        self.record(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.record(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.record(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Display) {
        self.record(LogLevel::Error, message);
    }

    fn record(&self, level: LogLevel, message: impl Display) {
        let message = message.to_string();
        match level {
            LogLevel::Debug => tracing::debug!(task = %self.task, "{}", message),
            LogLevel::Info => tracing::info!(task = %self.task, "{}", message),
            LogLevel::Warning => tracing::warn!(task = %self.task, "{}", message),
            LogLevel::Error => tracing::error!(task = %self.task, "{}", message),
        }

        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if let Some(writer) = guard.as_mut() {
            let line = format!(
                "{} {}- {}\n",
                Local::now().format(TIMESTAMP_FORMAT),
                level.label(),
                message
            );
            if let Err(e) = writer.write_all(line.as_bytes()) {
                tracing::warn!(task = %self.task, "Dropping task log output: {}", e);
                *guard = None;
            }
        }
    }

    /// Flush and close the log file
    pub fn detach(self) -> std::io::Result<()> {
        let writer = self
            .writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(mut writer) = writer {
            writer.flush()?;
        }
        Ok(())
    }
}

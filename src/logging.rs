// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Audit log for autosign decisions.
//!
//! The evaluator reports every check it runs through the [`Logger`] trait.
//! [`FileLogger`] is the sink the `autosign` binary installs: one line per
//! entry, appended to the configured log file, as plain text or JSON.
//!
//! ```no_run
//! use puppet_autosign::logging::{AuditFormat, FileLogger, LogLevel};
//!
//! # fn example() -> puppet_autosign::Result<()> {
//! let logger = FileLogger::open("puppetlabs-autosign.log", LogLevel::Debug)?
//!     .with_format(AuditFormat::Json);
//! logger.info("Autosign initiated for agent01.example.com")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs::{self, OpenOptions};
use std::fs::File;
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Severity of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum LogLevel {
    /// Per-pattern and per-attribute detail.
    Debug,
    /// Decisions and the checks that produced them.
    #[default]
    Info,
    /// Non-fatal check failures.
    Warn,
    /// Requests that could not be evaluated.
    Error,
}

impl LogLevel {
    /// Upper-case label used in text output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format written by [`FileLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditFormat {
    /// `<prefix> <epoch> [LEVEL] message key=value ...`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// One audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Structured context, in insertion order.
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self {
            level,
            message: message.into(),
            timestamp,
            fields: Vec::new(),
        }
    }

    /// Attach a structured field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// First value recorded for `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }

    /// Render the entry as a single line (without the newline).
    pub fn render(&self, format: AuditFormat, prefix: &str) -> String {
        match format {
            AuditFormat::Text => self.render_text(prefix),
            AuditFormat::Json => self.render_json(),
        }
    }

    fn render_text(&self, prefix: &str) -> String {
        let mut line = String::new();
        if !prefix.is_empty() {
            line.push_str(prefix);
            line.push(' ');
        }
        line.push_str(&format!("{} [{}] {}", self.timestamp, self.level, self.message));
        for (k, v) in &self.fields {
            line.push_str(&format!(" {k}={v}"));
        }
        line
    }

    fn render_json(&self) -> String {
        let mut obj = serde_json::Map::new();
        obj.insert("timestamp".into(), self.timestamp.into());
        obj.insert("level".into(), self.level.as_str().into());
        obj.insert("message".into(), self.message.as_str().into());
        for (k, v) in &self.fields {
            obj.insert(k.clone(), v.as_str().into());
        }
        serde_json::Value::Object(obj).to_string()
    }
}

/// Destination for audit entries.
pub trait Logger: Send + Sync {
    /// Record one entry.
    fn log(&self, entry: &LogEntry) -> Result<()>;
}

/// Emit `entry` as a tracing event and forward it to `sink`, if any.
///
/// A failed sink write is reported through tracing and otherwise ignored.
pub fn record(sink: Option<&dyn Logger>, entry: LogEntry) {
    match entry.level {
        LogLevel::Debug => tracing::debug!("{}", entry.message),
        LogLevel::Info => tracing::info!("{}", entry.message),
        LogLevel::Warn => tracing::warn!("{}", entry.message),
        LogLevel::Error => tracing::error!("{}", entry.message),
    }

    if let Some(sink) = sink
        && let Err(e) = sink.log(&entry)
    {
        tracing::warn!("Failed to write audit log entry: {}", e);
    }
}

/// Text line prefix.
pub const PREFIX: &str = "[autosign]";

/// Line-oriented audit sink backed by a file.
pub struct FileLogger {
    path: PathBuf,
    level: LogLevel,
    format: AuditFormat,
    out: Mutex<LineWriter<File>>,
}

impl fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("format", &self.format)
            .finish()
    }
}

impl FileLogger {
    /// Append to `path`, creating the file and its parent directory if needed.
    pub fn open(path: impl AsRef<Path>, level: LogLevel) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            level,
            format: AuditFormat::default(),
            out: Mutex::new(LineWriter::new(file)),
        })
    }

    /// Select the line format.
    pub fn with_format(mut self, format: AuditFormat) -> Self {
        self.format = format;
        self
    }

    /// The log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries below this level are dropped.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Record a message at `level` with no fields.
    pub fn write(&self, level: LogLevel, message: impl Into<String>) -> Result<()> {
        self.log(&LogEntry::new(level, message))
    }

    /// Record a debug message.
    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.write(LogLevel::Debug, message)
    }

    /// Record an info message.
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.write(LogLevel::Info, message)
    }

    /// Record a warning.
    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.write(LogLevel::Warn, message)
    }

    /// Record an error.
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.write(LogLevel::Error, message)
    }
}

impl Logger for FileLogger {
    fn log(&self, entry: &LogEntry) -> Result<()> {
        if entry.level < self.level {
            return Ok(());
        }

        let line = entry.render(self.format, PREFIX);
        // A poisoned lock only means another thread panicked mid-write.
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

//! Append-only destinations for build progress and captured output.
//!
//! Every sink must tolerate concurrent appends from parallel build tasks;
//! implementations either lock internally or funnel through a channel.

pub mod entry;
pub mod file;

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

pub use entry::{LogEntry, LogLevel};
pub use file::FileSink;

pub trait LogSink: Send + Sync {
    fn log(&self, entry: LogEntry);

    fn emit(&self, level: LogLevel, message: &str) {
        self.log(LogEntry::new(level, message));
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}

pub type SharedSink = Arc<dyn LogSink>;

/// Forwards entries to the interactive view.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LogEntry>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<LogEntry>) -> Self {
        Self { tx }
    }
}

impl LogSink for ChannelSink {
    fn log(&self, entry: LogEntry) {
        // A closed receiver means the view already shut down.
        let _ = self.tx.send(entry);
    }
}

/// Duplicates every entry into each inner sink, in order.
pub struct TeeSink {
    sinks: Vec<SharedSink>,
}

impl TeeSink {
    pub fn new(sinks: Vec<SharedSink>) -> Self {
        Self { sinks }
    }
}

impl LogSink for TeeSink {
    fn log(&self, entry: LogEntry) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.log(entry.clone());
            }
            last.log(entry);
        }
    }
}

/// Attributes every untagged entry to one project before passing it on.
pub struct ProjectSink {
    project: String,
    inner: SharedSink,
}

impl ProjectSink {
    pub fn new(project: impl Into<String>, inner: SharedSink) -> Self {
        Self {
            project: project.into(),
            inner,
        }
    }
}

impl LogSink for ProjectSink {
    fn log(&self, entry: LogEntry) {
        if entry.project.is_some() {
            self.inner.log(entry);
        } else {
            self.inner.log(entry.with_project(self.project.clone()));
        }
    }
}

#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

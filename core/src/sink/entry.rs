use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    /// Raw text captured from a child process.
    Output,
    /// A command line echoed before it runs.
    Command,
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Output => "OUTPUT",
            LogLevel::Command => "COMMAND",
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
    /// Project the entry was produced for, when it belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Message lines, each prefixed with `[project] ` for tagged process
    /// output so concurrent builds stay distinguishable.
    pub fn display_lines(&self) -> Vec<String> {
        let prefix = match (&self.project, self.level) {
            (Some(project), LogLevel::Output) => format!("[{}] ", project),
            _ => String::new(),
        };

        let lines: Vec<String> = self
            .message
            .lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect();
        if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        }
    }

    /// Number of display lines the message spans.
    pub fn line_count(&self) -> usize {
        self.message.lines().count().max(1)
    }
}

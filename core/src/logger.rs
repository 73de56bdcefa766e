use crate::sink::{LogEntry, LogLevel, LogSink};
use std::io::Write;

/// Console sink used by batch mode.
pub struct Logger {
    use_colors: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    pub fn print(&self, level: LogLevel, message: &str) {
        println!("{}", self.format(level, message));
        let _ = std::io::stdout().flush();
    }

    pub fn format(&self, level: LogLevel, message: &str) -> String {
        let message = message.trim_end_matches('\n');

        if !self.use_colors {
            return message.to_string();
        }

        match Self::color(level) {
            Some(color) => format!("{}{}\x1b[0m", color, message),
            None => message.to_string(),
        }
    }

    fn color(level: LogLevel) -> Option<&'static str> {
        match level {
            LogLevel::Debug => Some("\x1b[90m"),
            LogLevel::Output => None,
            LogLevel::Command => Some("\x1b[33m"),
            LogLevel::Info => Some("\x1b[36m"),
            LogLevel::Success => Some("\x1b[32m"),
            LogLevel::Warning => Some("\x1b[33;1m"),
            LogLevel::Error => Some("\x1b[31m"),
        }
    }
}

impl LogSink for Logger {
    fn log(&self, entry: LogEntry) {
        self.print(entry.level, &entry.display_lines().join("\n"));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format_strips_trailing_newline() {
        let logger = Logger::plain();
        assert_eq!(logger.format(LogLevel::Output, "a\nb\n"), "a\nb");
        assert_eq!(logger.format(LogLevel::Error, "boom"), "boom");
    }

    #[test]
    fn test_tagged_output_is_prefixed_per_line() {
        let entry = LogEntry::new(LogLevel::Output, "one\ntwo\n").with_project("api");
        let logger = Logger::plain();
        assert_eq!(
            logger.format(entry.level, &entry.display_lines().join("\n")),
            "[api] one\n[api] two"
        );
    }

    #[test]
    fn test_colored_format() {
        let logger = Logger { use_colors: true };
        assert_eq!(logger.format(LogLevel::Error, "boom"), "\x1b[31mboom\x1b[0m");
        assert_eq!(logger.format(LogLevel::Output, "raw"), "raw");
    }
}

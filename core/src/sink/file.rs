use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{LogEntry, LogSink};

/// Appends every message as plain text to the configured log file.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn log(&self, entry: LogEntry) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        // A full disk must not take the build down with it.
        let _ = writeln!(file, "{}", entry.display_lines().join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LogLevel;

    #[test]
    fn test_file_sink_appends_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("build.log");

        {
            let sink = FileSink::open(&path).unwrap();
            sink.info("first");
            sink.emit(LogLevel::Output, "line a\nline b\n");
        }
        {
            let sink = FileSink::open(&path).unwrap();
            sink.error("second run");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nline a\nline b\nsecond run\n");
    }
}

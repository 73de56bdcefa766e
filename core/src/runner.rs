//! Runs one command line in a project directory and captures its output.
//!
//! How a command line becomes a program plus arguments depends on the host
//! platform; that choice is a [`ShellStrategy`] picked once at startup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

use crate::config::EnvOverlay;
use crate::sink::{LogLevel, ProjectSink, SharedSink};

/// Lines of each command's output echoed to the log sink.
pub const TAIL_LINES: usize = 10;

/// Shells that are invoked directly instead of through `cmd /C`.
const ALTERNATE_SHELLS: [&str; 2] = ["powershell", "pwsh"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,
    #[error("failed to launch `{program}`: {reason}")]
    Launch { program: String, reason: String },
    #[error("failed waiting for `{program}`: {reason}")]
    Wait { program: String, reason: String },
    #[error("exit status {0}")]
    ExitCode(i32),
    #[error("terminated by signal {0}")]
    Signal(i32),
    #[error("terminated abnormally")]
    Abnormal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStrategy {
    /// Whitespace-split into argv; no shell metacharacter expansion.
    Argv,
    /// Hand the line to `cmd /C`, except for lines naming an alternate shell.
    WindowsCmd,
}

impl ShellStrategy {
    pub fn detect() -> Self {
        if cfg!(windows) {
            ShellStrategy::WindowsCmd
        } else {
            ShellStrategy::Argv
        }
    }

    pub fn resolve(&self, command_line: &str) -> Result<(String, Vec<String>), CommandError> {
        let line = command_line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        match self {
            ShellStrategy::Argv => split_argv(line),
            ShellStrategy::WindowsCmd => {
                if ALTERNATE_SHELLS.iter().any(|shell| line.starts_with(shell)) {
                    split_argv(line)
                } else {
                    Ok(("cmd".to_string(), vec!["/C".to_string(), line.to_string()]))
                }
            }
        }
    }
}

fn split_argv(line: &str) -> Result<(String, Vec<String>), CommandError> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or(CommandError::Empty)?;
    Ok((program, parts.collect()))
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// stdout and stderr interleaved in arrival order.
    pub output: String,
    pub error: Option<CommandError>,
    pub duration: Duration,
}

impl CommandOutput {
    fn failed(error: CommandError) -> Self {
        Self {
            output: String::new(),
            error: Some(error),
            duration: Duration::ZERO,
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct CommandRunner {
    strategy: ShellStrategy,
    sink: SharedSink,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(sink: SharedSink, timeout: Duration) -> Self {
        Self {
            strategy: ShellStrategy::detect(),
            sink,
            timeout,
        }
    }

    pub fn with_strategy(mut self, strategy: ShellStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ShellStrategy {
        self.strategy
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Runs a configured build command and echoes the tail of its output,
    /// whatever the outcome.
    pub async fn run(&self, command_line: &str, dir: &Path, env: &EnvOverlay) -> CommandOutput {
        let result = match self.strategy.resolve(command_line) {
            Ok((program, args)) => self.run_args(&program, &args, dir, env).await,
            Err(err) => CommandOutput::failed(err),
        };

        self.sink
            .emit(LogLevel::Output, tail_lines(&result.output, TAIL_LINES));

        result
    }

    /// Copy of this runner whose log entries are attributed to `project`.
    pub fn for_project(&self, project: &str) -> CommandRunner {
        CommandRunner {
            strategy: self.strategy,
            sink: Arc::new(ProjectSink::new(project, self.sink.clone())),
            timeout: self.timeout,
        }
    }

    /// Runs `program` with explicit arguments, bypassing the shell strategy.
    pub async fn run_args(
        &self,
        program: &str,
        args: &[String],
        dir: &Path,
        env: &EnvOverlay,
    ) -> CommandOutput {
        let start = Instant::now();

        // One pipe behind both stdout and stderr keeps the child's writes in
        // the order it made them.
        let (reader, stdout_writer) = match os_pipe::pipe() {
            Ok(pipe) => pipe,
            Err(err) => return CommandOutput::failed(launch_error(program, err)),
        };
        let stderr_writer = match stdout_writer.try_clone() {
            Ok(writer) => writer,
            Err(err) => return CommandOutput::failed(launch_error(program, err)),
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(absolute_dir(dir))
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(stdout_writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);

        let spawned = command.spawn();
        // The builder still owns our copies of the write ends; the reader
        // only sees EOF once they are closed.
        drop(command);

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => return CommandOutput::failed(launch_error(program, err)),
        };

        let combined = tokio::task::spawn_blocking(move || read_to_end(reader))
            .await
            .unwrap_or_default();

        let status = child.wait().await;
        let duration = start.elapsed();
        let output = String::from_utf8_lossy(&combined).into_owned();

        if duration > self.timeout && !self.timeout.is_zero() {
            self.sink.warn(&format!(
                "`{}` ran for {:.1}s, past the configured {}s timeout (not enforced)",
                program,
                duration.as_secs_f64(),
                self.timeout.as_secs()
            ));
        }

        let error = match status {
            Ok(status) => exit_error(status),
            Err(err) => Some(CommandError::Wait {
                program: program.to_string(),
                reason: err.to_string(),
            }),
        };

        CommandOutput {
            output,
            error,
            duration,
        }
    }
}

fn read_to_end(mut reader: os_pipe::PipeReader) -> Vec<u8> {
    let mut combined = Vec::new();
    // A read error ends the capture; whatever arrived is kept.
    let _ = reader.read_to_end(&mut combined);
    combined
}

fn launch_error(program: &str, err: std::io::Error) -> CommandError {
    CommandError::Launch {
        program: program.to_string(),
        reason: err.to_string(),
    }
}

fn exit_error(status: ExitStatus) -> Option<CommandError> {
    if status.success() {
        return None;
    }

    if let Some(code) = status.code() {
        return Some(CommandError::ExitCode(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return Some(CommandError::Signal(signal));
        }
    }

    Some(CommandError::Abnormal)
}

/// Absolute form of a project directory. When the current directory cannot
/// be determined the path is handed to the OS unchanged.
pub fn absolute_dir(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// The last `count` newline-separated pieces of `text`, or all of it.
pub fn tail_lines(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }

    let mut seen = 0;
    for (index, _) in text.rmatch_indices('\n') {
        seen += 1;
        if seen == count {
            return &text[index + 1..];
        }
    }

    text
}

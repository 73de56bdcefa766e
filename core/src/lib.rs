pub mod builder;
pub mod cli;
pub mod config;
pub mod git;
pub mod logger;
pub mod outcome;
pub mod reporter;
pub mod runner;
pub mod scheduler;
pub mod selection;
pub mod sink;
pub mod tui;

pub use builder::ProjectBuilder;
pub use cli::{Cli, Commands};
pub use config::{BuildConfig, Config, ConfigError, EnvOverlay, GitConfig, GlobalConfig, ProjectConfig};
pub use git::{RefreshError, RefreshStatus};
pub use logger::Logger;
pub use outcome::{BuildOutcome, ResultSet};
pub use reporter::{Reporter, Summary};
pub use runner::{CommandError, CommandOutput, CommandRunner, ShellStrategy};
pub use scheduler::{BuildScheduler, RunReport};
pub use selection::SelectionState;
pub use sink::{
    ChannelSink, FileSink, LogEntry, LogLevel, LogSink, MemorySink, ProjectSink, SharedSink, TeeSink,
};

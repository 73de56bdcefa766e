use std::sync::Arc;
use std::time::Instant;

use crate::config::ProjectConfig;
use crate::git;
use crate::outcome::BuildOutcome;
use crate::reporter::format_duration;
use crate::runner::CommandRunner;
use crate::sink::{LogLevel, SharedSink};

/// Runs one project's pipeline: optional git refresh, then each build
/// command in order, stopping at the first failure.
#[derive(Clone)]
pub struct ProjectBuilder {
    runner: Arc<CommandRunner>,
    sink: SharedSink,
}

impl ProjectBuilder {
    pub fn new(runner: Arc<CommandRunner>, sink: SharedSink) -> Self {
        Self { runner, sink }
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    pub async fn build(&self, project: &ProjectConfig) -> BuildOutcome {
        let start = Instant::now();
        let runner = self.runner.for_project(&project.name);
        let sink = runner.sink();

        sink.emit(
            LogLevel::Info,
            &format!(">>> Building {} ({})", project.name, project.kind),
        );

        if let Err(err) = git::refresh(&runner, project).await {
            sink.error(&format!("Git refresh failed: {}", err));
            return BuildOutcome::failed(&project.name, String::new(), err.to_string(), start.elapsed());
        }

        let dir = project.dir();
        let mut output = String::new();

        for command in &project.build.commands {
            sink.emit(LogLevel::Command, &format!("$ {}", command));

            let result = runner.run(command, &dir, &project.env).await;
            output.push_str(&result.output);

            if let Some(err) = result.error {
                sink.error(&format!("✗ Command failed: {}", err));
                return BuildOutcome::failed(&project.name, output, err.to_string(), start.elapsed());
            }
        }

        let duration = start.elapsed();
        sink.emit(
            LogLevel::Success,
            &format!(
                "✓ {} built successfully ({})",
                project.name,
                format_duration(duration)
            ),
        );

        BuildOutcome::succeeded(&project.name, output, duration)
    }
}

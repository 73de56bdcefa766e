//! Drives project builds for a run and collects their outcomes.
//!
//! Sequential runs build projects in input order on one task and honor
//! `stop_on_error`. Parallel runs spawn one task per project upfront and let
//! every task finish; `stop_on_error` does not apply to them.

use tokio::task::JoinHandle;

use crate::builder::ProjectBuilder;
use crate::config::{GlobalConfig, ProjectConfig};
use crate::outcome::{BuildOutcome, ResultSet};
use crate::reporter::Reporter;
use crate::sink::SharedSink;

pub const NO_SELECTION_WARNING: &str = "Select at least one project";

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<BuildOutcome>,
    /// A sequential run stopped early because of `stop_on_error`.
    pub halted: bool,
}

impl RunReport {
    /// Batch mode prints a summary unless a sequential run halted early.
    pub fn should_summarize(&self) -> bool {
        !self.halted
    }

    /// Process exit status for batch mode: 1 after a halt or any failure.
    pub fn exit_code(&self) -> i32 {
        if self.halted || self.outcomes.iter().any(|o| !o.success) {
            1
        } else {
            0
        }
    }
}

#[derive(Clone)]
pub struct BuildScheduler {
    builder: ProjectBuilder,
    sink: SharedSink,
    results: ResultSet,
}

impl BuildScheduler {
    pub fn new(builder: ProjectBuilder) -> Self {
        let sink = builder.sink().clone();
        Self {
            builder,
            sink,
            results: ResultSet::new(),
        }
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Begins a run in the background and summarizes it once it completes.
    /// Returns `None` when nothing was selected.
    pub fn start(
        &self,
        selected: Vec<ProjectConfig>,
        policy: GlobalConfig,
    ) -> Option<JoinHandle<RunReport>> {
        if selected.is_empty() {
            self.sink.warn(NO_SELECTION_WARNING);
            return None;
        }

        let scheduler = self.clone();
        Some(tokio::spawn(async move {
            let report = scheduler.execute(selected, &policy).await;
            Reporter::new(scheduler.sink.clone()).summarize(&report.outcomes);
            report
        }))
    }

    /// Runs every applicable build and returns the collected outcomes
    /// without summarizing them.
    pub async fn execute(&self, selected: Vec<ProjectConfig>, policy: &GlobalConfig) -> RunReport {
        if selected.is_empty() {
            self.sink.warn(NO_SELECTION_WARNING);
            return RunReport::default();
        }

        self.results.clear();

        let halted = if policy.parallel {
            self.build_parallel(selected).await;
            false
        } else {
            self.build_sequential(selected, policy.stop_on_error).await
        };

        RunReport {
            outcomes: self.results.snapshot(),
            halted,
        }
    }

    async fn build_sequential(&self, projects: Vec<ProjectConfig>, stop_on_error: bool) -> bool {
        for project in &projects {
            let outcome = self.builder.build(project).await;
            let failed = !outcome.success;
            self.results.push(outcome);

            if failed && stop_on_error {
                self.sink.error("Build failed, stopping remaining builds");
                return true;
            }
        }

        false
    }

    async fn build_parallel(&self, projects: Vec<ProjectConfig>) {
        let handles: Vec<(String, JoinHandle<()>)> = projects
            .into_iter()
            .map(|project| {
                let builder = self.builder.clone();
                let results = self.results.clone();
                let name = project.name.clone();
                let handle = tokio::spawn(async move {
                    let outcome = builder.build(&project).await;
                    results.push(outcome);
                });
                (name, handle)
            })
            .collect();

        for (name, handle) in handles {
            if let Err(err) = handle.await {
                self.sink
                    .error(&format!("Build task for {} did not finish: {}", name, err));
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::reporter::SUMMARY_BANNER;
    use crate::runner::CommandRunner;
    use crate::sink::MemorySink;
    use std::sync::Arc;
    use std::time::Duration;

    fn scheduler() -> (BuildScheduler, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let runner = Arc::new(CommandRunner::new(sink.clone(), Duration::from_secs(600)));
        let builder = ProjectBuilder::new(runner, sink.clone());
        (BuildScheduler::new(builder), sink)
    }

    fn project(dir: &tempfile::TempDir, name: &str, commands: &[&str]) -> ProjectConfig {
        ProjectConfig::new(name, dir.path().to_string_lossy()).with_commands(commands.to_vec())
    }

    fn policy(parallel: bool, stop_on_error: bool) -> GlobalConfig {
        GlobalConfig {
            parallel,
            stop_on_error,
            ..GlobalConfig::default()
        }
    }

    fn names(outcomes: &[BuildOutcome]) -> Vec<&str> {
        outcomes.iter().map(|o| o.project.as_str()).collect()
    }

    #[tokio::test]
    async fn test_sequential_keeps_input_order() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "p1", &["echo 1"]),
            project(&dir, "p2", &["false"]),
            project(&dir, "p3", &["echo 3"]),
        ];

        let report = scheduler.execute(projects, &policy(false, false)).await;

        assert!(!report.halted);
        assert_eq!(names(&report.outcomes), vec!["p1", "p2", "p3"]);
        assert!(report.outcomes[0].success);
        assert!(!report.outcomes[1].success);
        assert!(report.outcomes[2].success);
    }

    #[tokio::test]
    async fn test_sequential_stop_on_error_halts_after_first_failure() {
        let (scheduler, sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "p1", &["echo 1"]),
            project(&dir, "p2", &["false"]),
            project(&dir, "p3", &["echo never-run"]),
            project(&dir, "p4", &["echo never-run"]),
        ];

        let report = scheduler.execute(projects, &policy(false, true)).await;

        assert!(report.halted);
        assert_eq!(names(&report.outcomes), vec!["p1", "p2"]);
        assert!(!sink.contains(">>> Building p3"));
        assert!(sink.contains("stopping remaining builds"));
    }

    #[tokio::test]
    async fn test_sequential_stop_on_error_without_failures_runs_everything() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "p1", &["echo 1"]),
            project(&dir, "p2", &["echo 2"]),
        ];

        let report = scheduler.execute(projects, &policy(false, true)).await;

        assert!(!report.halted);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_stop_on_error_failure_summarizes_then_fails() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "svc-a", &["false"]),
            project(&dir, "svc-b", &["echo b"]),
        ];

        let report = scheduler.execute(projects, &policy(true, true)).await;

        assert!(report.should_summarize());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_sequential_halt_skips_summary() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "p1", &["false"]),
            project(&dir, "p2", &["echo 2"]),
        ];

        let report = scheduler.execute(projects, &policy(false, true)).await;

        assert!(!report.should_summarize());
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_clean_run_exits_zero() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();

        let report = scheduler
            .execute(vec![project(&dir, "p1", &["echo 1"])], &policy(true, true))
            .await;

        assert!(report.should_summarize());
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_parallel_produces_one_outcome_per_project() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "svc-a", &["echo a"]),
            project(&dir, "svc-b", &["echo b"]),
        ];

        let report = scheduler.execute(projects, &policy(true, false)).await;

        let mut built = names(&report.outcomes);
        built.sort();
        assert_eq!(built, vec!["svc-a", "svc-b"]);
        assert!(report.outcomes.iter().all(|o| o.success));
    }

    #[tokio::test]
    async fn test_parallel_ignores_stop_on_error() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects: Vec<ProjectConfig> = (0..8)
            .map(|i| {
                let commands: &[&str] = if i == 0 { &["false"] } else { &["echo ok"] };
                project(&dir, &format!("p{i}"), commands)
            })
            .collect();

        let report = scheduler.execute(projects, &policy(true, true)).await;

        assert!(!report.halted);
        assert_eq!(report.outcomes.len(), 8);
        let mut built = names(&report.outcomes);
        built.sort();
        built.dedup();
        assert_eq!(built.len(), 8);
        assert_eq!(report.outcomes.iter().filter(|o| !o.success).count(), 1);
    }

    #[tokio::test]
    async fn test_empty_selection_warns_and_does_nothing() {
        let (scheduler, sink) = scheduler();

        assert!(scheduler.start(Vec::new(), policy(false, false)).is_none());
        let report = scheduler.execute(Vec::new(), &policy(true, false)).await;

        assert!(report.outcomes.is_empty());
        assert_eq!(
            sink.messages(),
            vec![NO_SELECTION_WARNING, NO_SELECTION_WARNING]
        );
    }

    #[tokio::test]
    async fn test_results_are_reset_between_runs() {
        let (scheduler, _sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();

        scheduler
            .execute(vec![project(&dir, "first", &["echo 1"])], &policy(false, false))
            .await;
        let report = scheduler
            .execute(vec![project(&dir, "second", &["echo 2"])], &policy(false, false))
            .await;

        assert_eq!(names(&report.outcomes), vec!["second"]);
        assert_eq!(scheduler.results().len(), 1);
    }

    #[tokio::test]
    async fn test_start_summarizes_once() {
        let (scheduler, sink) = scheduler();
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![
            project(&dir, "svc-a", &["echo a"]),
            project(&dir, "svc-b", &["echo b"]),
        ];

        let handle = scheduler.start(projects, policy(true, false)).unwrap();
        let report = handle.await.unwrap();

        assert_eq!(report.outcomes.len(), 2);
        let banners = sink
            .messages()
            .iter()
            .filter(|m| m.as_str() == SUMMARY_BANNER)
            .count();
        assert_eq!(banners, 1);
        assert!(sink.contains("2 succeeded, 0 failed"));
    }
}

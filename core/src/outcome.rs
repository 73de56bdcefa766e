use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Result of attempting one project's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub project: String,
    pub success: bool,
    /// Output of every command attempted, concatenated.
    pub output: String,
    /// Empty on success.
    pub error: String,
    pub duration: Duration,
}

impl BuildOutcome {
    pub fn succeeded(project: impl Into<String>, output: String, duration: Duration) -> Self {
        Self {
            project: project.into(),
            success: true,
            output,
            error: String::new(),
            duration,
        }
    }

    pub fn failed(
        project: impl Into<String>,
        output: String,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            project: project.into(),
            success: false,
            output,
            error: error.into(),
            duration,
        }
    }
}

/// Outcomes of the current run, shared between concurrent build tasks.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    outcomes: Arc<Mutex<Vec<BuildOutcome>>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: BuildOutcome) {
        self.lock().push(outcome);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn snapshot(&self) -> Vec<BuildOutcome> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BuildOutcome>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

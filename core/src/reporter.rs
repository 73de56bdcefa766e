use std::time::Duration;

use crate::outcome::BuildOutcome;
use crate::sink::{LogLevel, SharedSink};

pub const SUMMARY_BANNER: &str = "========== Build Summary ==========";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[BuildOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}

pub struct Reporter {
    sink: SharedSink,
}

impl Reporter {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }

    pub fn summarize(&self, outcomes: &[BuildOutcome]) {
        self.sink.emit(LogLevel::Success, SUMMARY_BANNER);

        for outcome in outcomes {
            if outcome.success {
                self.sink.emit(
                    LogLevel::Success,
                    &format!(
                        "✓ {} - succeeded ({})",
                        outcome.project,
                        format_duration(outcome.duration)
                    ),
                );
            } else {
                self.sink.emit(
                    LogLevel::Error,
                    &format!("✗ {} - failed: {}", outcome.project, outcome.error),
                );
            }
        }

        self.sink
            .info(&Summary::from_outcomes(outcomes).to_string());
        self.sink.info(&format!("Platform: {}", platform()));
    }
}

pub fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

pub fn format_duration(duration: Duration) -> String {
    format!("{:.2?}", duration)
}

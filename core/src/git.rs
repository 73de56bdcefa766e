use thiserror::Error;

use crate::config::ProjectConfig;
use crate::runner::{absolute_dir, CommandError, CommandRunner};
use crate::sink::LogLevel;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("failed to switch branch: {0}")]
    Checkout(CommandError),
    #[error("git pull failed: {0}")]
    Pull(CommandError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// The project does not ask for a pull.
    NotRequested,
    /// The project directory is not a git working copy.
    Skipped,
    Updated,
}

/// Brings a project's working copy up to date before it is built.
pub async fn refresh(
    runner: &CommandRunner,
    project: &ProjectConfig,
) -> Result<RefreshStatus, RefreshError> {
    if !project.git.pull {
        return Ok(RefreshStatus::NotRequested);
    }

    let sink = runner.sink();
    let dir = absolute_dir(&project.dir());

    if !dir.join(".git").exists() {
        sink.warn("Skipping git refresh (not a git repository)");
        return Ok(RefreshStatus::Skipped);
    }

    let branch = project.git.branch.trim();
    if !branch.is_empty() {
        let checkout = runner
            .run_args("git", &args(["checkout", branch]), &dir, &project.env)
            .await;
        if let Some(err) = checkout.error {
            return Err(RefreshError::Checkout(err));
        }
        sink.emit(LogLevel::Info, &format!("Switched to branch: {}", branch));
    }

    if project.git.reset {
        let reset = runner
            .run_args("git", &args(["reset", "--hard", "HEAD"]), &dir, &project.env)
            .await;
        // Discarding local changes is best-effort; the pull decides the outcome.
        if let Some(err) = reset.error {
            sink.emit(LogLevel::Debug, &format!("git reset ignored: {}", err));
        }
    }

    let pull = runner
        .run_args("git", &args(["pull"]), &dir, &project.env)
        .await;
    if let Some(err) = pull.error {
        return Err(RefreshError::Pull(err));
    }

    sink.emit(LogLevel::Info, &format!("Git: {}", pull.output.trim()));
    Ok(RefreshStatus::Updated)
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Local git repositories for exercising a real refresh.
#[cfg(all(test, unix))]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};
    use std::process::{Command, Stdio};

    pub fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=yeah-build", "-c", "user.email=yeah-build@example.com"])
            .args(args)
            .current_dir(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    /// An `origin` repository with one commit on `main` holding
    /// `version.txt = "1"`, cloned into `clone`. Returns the clone.
    pub fn cloned_working_copy(root: &Path) -> PathBuf {
        let origin = root.join("origin");
        std::fs::create_dir(&origin).unwrap();
        git(&origin, &["init", "-q"]);
        git(&origin, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        std::fs::write(origin.join("version.txt"), "1\n").unwrap();
        git(&origin, &["add", "version.txt"]);
        git(&origin, &["commit", "-q", "-m", "initial"]);

        git(root, &["clone", "-q", "origin", "clone"]);
        root.join("clone")
    }
}

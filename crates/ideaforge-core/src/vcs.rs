//! Version-control primitives and the `git` CLI implementation.
//!
//! Every operation either succeeds with a [`VcsOutcome`] or fails with
//! [`ForgeError::Vcs`] carrying the exit status and captured diagnostic.
//! "Nothing to commit" is recognized here, once, and reported as
//! [`VcsOutcome::NothingToCommit`] so callers never inspect git's text.

use crate::error::{ForgeError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsOutcome {
    Applied,
    /// The working tree already matches the last commit.
    NothingToCommit,
}

/// Remote and branch for `push -u`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub remote: String,
    pub branch: String,
}

impl Upstream {
    pub fn origin(branch: impl Into<String>) -> Self {
        Self {
            remote: "origin".to_string(),
            branch: branch.into(),
        }
    }
}

pub trait Vcs {
    /// Stage `paths` (relative to `repo` or absolute inside it).
    fn stage(&self, repo: &Path, paths: &[PathBuf]) -> Result<VcsOutcome>;

    fn commit(&self, repo: &Path, message: &str) -> Result<VcsOutcome>;

    /// Push the current branch. With `upstream`, push to it and record the
    /// tracking link (`push -u <remote> <branch>`).
    fn push(&self, repo: &Path, upstream: Option<&Upstream>) -> Result<VcsOutcome>;

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<VcsOutcome>;

    /// Configure the repository-local commit author.
    fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<VcsOutcome>;

    /// Create or reset `branch` to the current HEAD and check it out.
    fn checkout_branch(&self, repo: &Path, branch: &str) -> Result<VcsOutcome>;
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

const NOTHING_TO_COMMIT: &[&str] = &["nothing to commit", "nothing added to commit"];

/// Runs the `git` executable, capturing stdout and stderr.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    secrets: Vec<String>,
}

impl GitCli {
    /// Locate `git` on `PATH`.
    pub fn detect() -> Result<Self> {
        let program = which::which("git").map_err(|_| ForgeError::VcsUnavailable)?;
        Ok(Self::with_program(program))
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            secrets: Vec::new(),
        }
    }

    /// Strings (tokens) that must never appear in diagnostics or logs.
    pub fn redacting(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, s| acc.replace(s.as_str(), "***"))
    }

    fn run(&self, op: &'static str, cwd: Option<&Path>, args: &[&str]) -> Result<VcsOutcome> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        // Never block on a credential prompt in unattended runs.
        cmd.env("GIT_TERMINAL_PROMPT", "0");

        tracing::debug!(op, args = %self.redact(&args.join(" ")), "git");

        let output = cmd.output().map_err(|e| ForgeError::Vcs {
            op,
            code: None,
            diagnostic: self.redact(&e.to_string()),
        })?;

        if output.status.success() {
            return Ok(VcsOutcome::Applied);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = self.redact(
            [stderr.trim(), stdout.trim()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join("\n")
                .as_str(),
        );

        if is_nothing_to_commit(&diagnostic) {
            return Ok(VcsOutcome::NothingToCommit);
        }
        Err(ForgeError::Vcs {
            op,
            code: output.status.code(),
            diagnostic,
        })
    }
}

/// Whether a failed git invocation only reported a clean tree.
pub fn is_nothing_to_commit(diagnostic: &str) -> bool {
    NOTHING_TO_COMMIT.iter().any(|s| diagnostic.contains(s))
}

impl Vcs for GitCli {
    fn stage(&self, repo: &Path, paths: &[PathBuf]) -> Result<VcsOutcome> {
        let mut args: Vec<String> = vec!["add".into(), "--".into()];
        args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run("add", Some(repo), &args)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<VcsOutcome> {
        self.run("commit", Some(repo), &["commit", "-m", message])
    }

    fn push(&self, repo: &Path, upstream: Option<&Upstream>) -> Result<VcsOutcome> {
        match upstream {
            Some(up) => self.run(
                "push",
                Some(repo),
                &["push", "-u", up.remote.as_str(), up.branch.as_str()],
            ),
            None => self.run("push", Some(repo), &["push"]),
        }
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<VcsOutcome> {
        let dest = dest.to_string_lossy();
        self.run("clone", None, &["clone", "--quiet", url, dest.as_ref()])
    }

    fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<VcsOutcome> {
        self.run("config", Some(repo), &["config", "user.name", name])?;
        self.run("config", Some(repo), &["config", "user.email", email])
    }

    fn checkout_branch(&self, repo: &Path, branch: &str) -> Result<VcsOutcome> {
        self.run("checkout", Some(repo), &["checkout", "-B", branch])
    }
}

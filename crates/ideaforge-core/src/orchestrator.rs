//! One run of the agent.
//!
//! `Start → Selected → (ContextBuilt) → ModelCalled → Parsed → Mutated →
//! Published → Done`, with `Failed { stage, reason }` reachable from every
//! step. Nothing is persisted between runs; the returned [`RunReport`] is
//! the only record of what happened.

use crate::config::{Config, Mode};
use crate::context::{self, ContextBudget};
use crate::error::{ForgeError, Result};
use crate::hosting::RepoHost;
use crate::manifest;
use crate::mutator;
use crate::parser::{self, ProjectFile};
use crate::paths;
use crate::prompts;
use crate::publish::{self, NewRepoError, PublishOutcome, Publisher};
use crate::selector::{self, Task};
use crate::transport::{ModelRequest, ModelTransport};
use crate::vcs::Vcs;
use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Stage / Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Select,
    Context,
    Model,
    Parse,
    Mutate,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Select => "select",
            Stage::Context => "context",
            Stage::Model => "model",
            Stage::Parse => "parse",
            Stage::Mutate => "mutate",
            Stage::Publish => "publish",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Done { publish: PublishOutcome },
    Failed { stage: Stage, reason: String },
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// `None` only when selection itself failed.
    pub task: Option<Task>,
    pub project: Option<String>,
    pub files_written: usize,
    pub outcome: Outcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Done { .. })
    }

    /// The one-line status printed at the end of a run.
    pub fn status_line(&self) -> String {
        let project = self.project.as_deref().unwrap_or("-");
        match &self.outcome {
            Outcome::Done { publish } => {
                let note = match publish {
                    PublishOutcome::Published => String::new(),
                    PublishOutcome::NothingToCommit => " (nothing to commit)".to_string(),
                    PublishOutcome::StaleManifest { reason } => {
                        format!(" (manifest not updated: {reason})")
                    }
                };
                format!(
                    "Done. {project}: {} file(s) written{note}",
                    self.files_written
                )
            }
            Outcome::Failed { stage, reason } => {
                format!("Failed. {project}: {stage}: {reason}")
            }
        }
    }
}

/// A stage failure carried up to [`Orchestrator::run_at`].
struct StageError {
    stage: Stage,
    error: ForgeError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a, R: Rng> {
    config: &'a Config,
    transport: &'a dyn ModelTransport,
    vcs: &'a dyn Vcs,
    host: Option<&'a dyn RepoHost>,
    rng: R,
}

/// Mutable progress of a run, folded into the report at the end.
#[derive(Default)]
struct Progress {
    task: Option<Task>,
    project: Option<String>,
    files_written: usize,
}

impl<'a, R: Rng> Orchestrator<'a, R> {
    pub fn new(
        config: &'a Config,
        transport: &'a dyn ModelTransport,
        vcs: &'a dyn Vcs,
        rng: R,
    ) -> Self {
        Self {
            config,
            transport,
            vcs,
            host: None,
            rng,
        }
    }

    /// Repository host used in multi-repo mode.
    pub fn with_host(mut self, host: &'a dyn RepoHost) -> Self {
        self.host = Some(host);
        self
    }

    pub fn run(&mut self) -> RunReport {
        self.run_at(Local::now())
    }

    /// Run once with `now` as the creation time for any new project.
    pub fn run_at(&mut self, now: DateTime<Local>) -> RunReport {
        let mut progress = Progress::default();
        let result = self.drive(now, &mut progress);
        let outcome = match result {
            Ok(publish) => Outcome::Done { publish },
            Err(StageError { stage, error }) => {
                tracing::error!(%stage, error = %error, "run failed");
                Outcome::Failed {
                    stage,
                    reason: error.to_string(),
                }
            }
        };
        RunReport {
            task: progress.task,
            project: progress.project,
            files_written: progress.files_written,
            outcome,
        }
    }

    fn drive(
        &mut self,
        now: DateTime<Local>,
        progress: &mut Progress,
    ) -> std::result::Result<PublishOutcome, StageError> {
        let config = self.config;
        let known = manifest::known_projects(config).at(Stage::Select)?;
        let task = selector::select(
            &known,
            config.settings.new_project_probability,
            &mut self.rng,
        );
        tracing::info!(
            task = %task,
            mode = config.mode.as_str(),
            known = known.len(),
            "task selected"
        );
        progress.task = Some(task.clone());

        match (&config.mode, task) {
            (Mode::SingleRepo, Task::NewProject) => self.new_in_place(now, progress),
            (Mode::SingleRepo, Task::ImproveProject { target }) => {
                self.improve_in_place(&target, progress)
            }
            (Mode::MultiRepo(account), Task::NewProject) => {
                let host = self.require_host()?;
                self.new_remote(host, &account.token, now, progress)
            }
            (Mode::MultiRepo(account), Task::ImproveProject { target }) => {
                let host = self.require_host()?;
                self.improve_remote(host, &account.token, &target, progress)
            }
        }
    }

    fn require_host(&self) -> std::result::Result<&'a dyn RepoHost, StageError> {
        self.host.ok_or_else(|| StageError {
            stage: Stage::Select,
            error: ForgeError::ConfigInvalid("multi-repo mode needs a repository host".into()),
        })
    }

    fn publisher(&self) -> Publisher<'_> {
        Publisher::new(self.vcs, &self.config.settings, &self.config.root)
    }

    fn budget(&self) -> ContextBudget {
        ContextBudget {
            max_chars: self.config.settings.context_budget,
            per_file_overhead: self.config.settings.context_file_overhead,
        }
    }

    fn call_model(&self, request: &ModelRequest) -> std::result::Result<String, StageError> {
        tracing::info!(
            model = %self.config.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "calling model"
        );
        let reply = self.transport.complete(request).at(Stage::Model)?;
        tracing::info!(chars = reply.chars().count(), "model replied");
        Ok(reply)
    }

    /// Parse a new-project reply; a reply without markers becomes one
    /// fallback file holding the capped raw text. A blank reply has nothing
    /// to keep and fails the parse.
    fn parse_new(
        &self,
        reply: &str,
        slug: &str,
    ) -> std::result::Result<Vec<ProjectFile>, StageError> {
        let files = parser::parse(reply);
        if !files.is_empty() {
            return Ok(files);
        }
        if reply.trim().is_empty() {
            return Err(StageError {
                stage: Stage::Parse,
                error: ForgeError::ParseMiss(slug.to_string()),
            });
        }
        let name = paths::fallback_file_name(slug);
        tracing::warn!(file = %name, "no file markers in reply, writing fallback file");
        let content: String = reply.chars().take(self.config.settings.fallback_cap).collect();
        Ok(vec![ProjectFile::new(name, content)])
    }

    fn parse_improve(
        &self,
        reply: &str,
        target: &str,
    ) -> std::result::Result<Vec<ProjectFile>, StageError> {
        let files = parser::parse(reply);
        if files.is_empty() {
            return Err(StageError {
                stage: Stage::Parse,
                error: ForgeError::ParseMiss(target.to_string()),
            });
        }
        Ok(files)
    }

    // -----------------------------------------------------------------------
    // Single-repo mode
    // -----------------------------------------------------------------------

    fn new_in_place(
        &mut self,
        now: DateTime<Local>,
        progress: &mut Progress,
    ) -> std::result::Result<PublishOutcome, StageError> {
        let slug = paths::project_slug(&now);
        progress.project = Some(slug.clone());

        let reply = self.call_model(&prompts::new_project_request(&self.config.settings))?;
        let files = self.parse_new(&reply, &slug)?;

        let dir = self.config.ideas_dir().join(&slug);
        progress.files_written = mutator::apply(&dir, &files).at(Stage::Mutate)?;
        tracing::info!(project = %slug, files = progress.files_written, "files written");

        self.publisher()
            .publish_in_place(&dir, &publish::new_project_message(&slug))
            .at(Stage::Publish)
    }

    fn improve_in_place(
        &mut self,
        target: &str,
        progress: &mut Progress,
    ) -> std::result::Result<PublishOutcome, StageError> {
        progress.project = Some(target.to_string());
        paths::validate_project_name(target).at(Stage::Context)?;
        let dir = self.config.ideas_dir().join(target);
        if !dir.is_dir() {
            return Err(StageError {
                stage: Stage::Context,
                error: ForgeError::ProjectNotFound(target.to_string()),
            });
        }

        let blob = context::build_context(&dir, self.budget());
        let request = prompts::improve_request(&self.config.settings, target, &blob);
        let reply = self.call_model(&request)?;
        let files = self.parse_improve(&reply, target)?;

        progress.files_written = mutator::apply(&dir, &files).at(Stage::Mutate)?;
        tracing::info!(project = %target, files = progress.files_written, "files written");

        self.publisher()
            .publish_in_place(&dir, &publish::improve_message(target))
            .at(Stage::Publish)
    }

    // -----------------------------------------------------------------------
    // Multi-repo mode
    // -----------------------------------------------------------------------

    fn new_remote(
        &mut self,
        host: &dyn RepoHost,
        token: &str,
        now: DateTime<Local>,
        progress: &mut Progress,
    ) -> std::result::Result<PublishOutcome, StageError> {
        let name = paths::repo_name(&now, &mut self.rng);
        progress.project = Some(name.clone());

        let reply = self.call_model(&prompts::new_project_request(&self.config.settings))?;
        let files = self.parse_new(&reply, &paths::project_slug(&now))?;

        let (written, outcome) = self
            .publisher()
            .publish_new_repo(host, token, &name, &files)
            .map_err(|e| match e {
                NewRepoError::Mutate(error) => StageError {
                    stage: Stage::Mutate,
                    error,
                },
                NewRepoError::Publish(error) => StageError {
                    stage: Stage::Publish,
                    error,
                },
            })?;
        progress.files_written = written;
        Ok(outcome)
    }

    fn improve_remote(
        &mut self,
        host: &dyn RepoHost,
        token: &str,
        target: &str,
        progress: &mut Progress,
    ) -> std::result::Result<PublishOutcome, StageError> {
        progress.project = Some(target.to_string());
        paths::validate_project_name(target).at(Stage::Context)?;

        let publisher = self.publisher();
        let clone = publisher
            .open_scratch(target, &host.clone_url(target), token)
            .at(Stage::Context)?;

        let blob = context::build_context(clone.path(), self.budget());
        let request = prompts::improve_request(&self.config.settings, target, &blob);
        let reply = self.call_model(&request)?;
        let files = self.parse_improve(&reply, target)?;

        progress.files_written = mutator::apply(clone.path(), &files).at(Stage::Mutate)?;
        tracing::info!(project = %target, files = progress.files_written, "files written");

        publisher
            .publish_scratch(&clone, &publish::improve_message(target))
            .at(Stage::Publish)
    }
}

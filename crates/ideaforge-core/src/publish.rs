//! Version-control and remote-repository side effects of a run.
//!
//! Single-repo mode commits the project directory inside the primary
//! repository. Multi-repo mode works in a scratch clone that lives in a
//! [`TempDir`] and disappears when the [`ScratchClone`] is dropped, whatever
//! the outcome.

use crate::config::Settings;
use crate::error::{ForgeError, Result};
use crate::hosting::{authenticated_url, NewRepo, RepoHost};
use crate::manifest;
use crate::mutator;
use crate::parser::ProjectFile;
use crate::paths;
use crate::vcs::{Upstream, Vcs, VcsOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published,
    /// The commit was a no-op; nothing was pushed.
    NothingToCommit,
    /// The project repository was pushed but recording it in the manifest
    /// failed. Later runs will not pick it as an improve target.
    StaleManifest { reason: String },
}

pub fn new_project_message(name: &str) -> String {
    format!("New idea: {name}")
}

pub fn improve_message(name: &str) -> String {
    format!("Improve: {name}")
}

pub fn manifest_message(name: &str) -> String {
    format!("Track: {name}")
}

/// Failure of [`Publisher::publish_new_repo`], split by the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum NewRepoError {
    /// Writing the files into the scratch clone failed.
    #[error(transparent)]
    Mutate(ForgeError),
    /// Creating the remote or one of the git steps failed.
    #[error(transparent)]
    Publish(ForgeError),
}

// ---------------------------------------------------------------------------
// ScratchClone
// ---------------------------------------------------------------------------

/// A private working copy of a remote repository for one run.
#[derive(Debug)]
pub struct ScratchClone {
    _dir: TempDir,
    path: PathBuf,
    name: String,
}

impl ScratchClone {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

pub struct Publisher<'a> {
    vcs: &'a dyn Vcs,
    settings: &'a Settings,
    root: &'a Path,
}

impl<'a> Publisher<'a> {
    pub fn new(vcs: &'a dyn Vcs, settings: &'a Settings, root: &'a Path) -> Self {
        Self {
            vcs,
            settings,
            root,
        }
    }

    /// Stage `project_dir`, commit it with `message` and push the primary
    /// repository.
    pub fn publish_in_place(&self, project_dir: &Path, message: &str) -> Result<PublishOutcome> {
        let rel = project_dir
            .strip_prefix(self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| project_dir.to_path_buf());
        self.commit_and_push(self.root, &[rel], message, None)
    }

    /// Clone `clone_url` (credentials embedded from `token`) into a fresh
    /// scratch directory.
    pub fn open_scratch(&self, name: &str, clone_url: &str, token: &str) -> Result<ScratchClone> {
        let dir = TempDir::new()?;
        let path = dir.path().join(name);
        self.vcs
            .clone_repo(&authenticated_url(clone_url, token), &path)?;
        self.vcs
            .set_identity(&path, &self.settings.commit_name, &self.settings.commit_email)?;
        tracing::info!(repo = %name, "cloned into scratch directory");
        Ok(ScratchClone {
            _dir: dir,
            path,
            name: name.to_string(),
        })
    }

    /// Commit everything in the scratch clone and push it to
    /// `origin/<default_branch>`, checking that branch out first.
    pub fn publish_scratch(&self, clone: &ScratchClone, message: &str) -> Result<PublishOutcome> {
        let branch = self.settings.default_branch.as_str();
        self.vcs.checkout_branch(clone.path(), branch)?;
        self.commit_and_push(
            clone.path(),
            &[PathBuf::from(".")],
            message,
            Some(&Upstream::origin(branch)),
        )
    }

    /// The full multi-repo flow for a new project: create the remote, fill
    /// a scratch clone with `files`, push, then record the name in the
    /// manifest of the primary repository.
    ///
    /// Failure to create the remote aborts before any local side effect.
    /// Failure to record the manifest is reported as
    /// [`PublishOutcome::StaleManifest`], since the project itself is live.
    pub fn publish_new_repo(
        &self,
        host: &dyn RepoHost,
        token: &str,
        name: &str,
        files: &[ProjectFile],
    ) -> std::result::Result<(usize, PublishOutcome), NewRepoError> {
        let remote = host
            .create_repo(&NewRepo {
                name: name.to_string(),
                description: "Small project generated by ideaforge".to_string(),
                private: self.settings.private_repos,
            })
            .map_err(NewRepoError::Publish)?;

        let clone = self
            .open_scratch(name, &remote.clone_url, token)
            .map_err(NewRepoError::Publish)?;
        let written = mutator::apply(clone.path(), files).map_err(NewRepoError::Mutate)?;
        tracing::info!(repo = %name, files = written, "files written");
        let outcome = self
            .publish_scratch(&clone, &new_project_message(name))
            .map_err(NewRepoError::Publish)?;
        drop(clone);

        if outcome == PublishOutcome::NothingToCommit {
            return Ok((written, outcome));
        }

        let manifest_path = paths::manifest_path(self.root, &self.settings.manifest_file);
        match self.record_in_manifest(&manifest_path, name) {
            Ok(_) => Ok((written, PublishOutcome::Published)),
            Err(e) => {
                tracing::warn!(repo = %name, error = %e, "project pushed but manifest not updated");
                Ok((
                    written,
                    PublishOutcome::StaleManifest {
                        reason: e.to_string(),
                    },
                ))
            }
        }
    }

    fn record_in_manifest(&self, manifest_path: &Path, name: &str) -> Result<PublishOutcome> {
        manifest::append(manifest_path, name)?;
        let rel = manifest_path
            .strip_prefix(self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| manifest_path.to_path_buf());
        self.commit_and_push(self.root, &[rel], &manifest_message(name), None)
    }

    fn commit_and_push(
        &self,
        repo: &Path,
        pathspecs: &[PathBuf],
        message: &str,
        upstream: Option<&Upstream>,
    ) -> Result<PublishOutcome> {
        self.vcs.stage(repo, pathspecs)?;
        if self.vcs.commit(repo, message)? == VcsOutcome::NothingToCommit {
            tracing::info!(%message, "nothing to commit");
            return Ok(PublishOutcome::NothingToCommit);
        }
        if self.vcs.push(repo, upstream)? == VcsOutcome::NothingToCommit {
            tracing::info!(%message, "push reported nothing to commit");
            return Ok(PublishOutcome::NothingToCommit);
        }
        tracing::info!(%message, "pushed");
        Ok(PublishOutcome::Published)
    }
}

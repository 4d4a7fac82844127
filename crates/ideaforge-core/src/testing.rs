//! Recording fakes for the collaborator traits.

use crate::error::{ForgeError, Result};
use crate::hosting::{NewRepo, RemoteRepo, RepoHost};
use crate::parser::ProjectFile;
use crate::transport::{ModelRequest, ModelTransport};
use crate::vcs::{Upstream, Vcs, VcsOutcome};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// FakeVcs
// ---------------------------------------------------------------------------

/// One recorded VCS call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsCall {
    pub op: &'static str,
    pub repo: PathBuf,
    pub detail: String,
}

#[derive(Default)]
pub struct FakeVcs {
    pub calls: RefCell<Vec<VcsCall>>,
    /// Files materialized by `clone_repo`, as if the remote held them.
    pub remote_files: Vec<ProjectFile>,
    clean_tree: bool,
    up_to_date_push: bool,
    /// op -> number of calls that succeed before the op starts failing.
    failures: HashMap<&'static str, usize>,
    counts: RefCell<HashMap<&'static str, usize>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every commit reports [`VcsOutcome::NothingToCommit`].
    pub fn with_clean_tree(mut self) -> Self {
        self.clean_tree = true;
        self
    }

    /// Every push reports [`VcsOutcome::NothingToCommit`], as `GitCli` does
    /// when git's diagnostic says there was nothing to commit.
    pub fn with_up_to_date_push(mut self) -> Self {
        self.up_to_date_push = true;
        self
    }

    /// Let `op` succeed `after` times, then fail.
    pub fn failing(mut self, op: &'static str, after: usize) -> Self {
        self.failures.insert(op, after);
        self
    }

    pub fn with_remote_files(mut self, files: Vec<ProjectFile>) -> Self {
        self.remote_files = files;
        self
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|c| c.op).collect()
    }

    fn record(&self, op: &'static str, repo: &Path, detail: String) -> Result<()> {
        self.calls.borrow_mut().push(VcsCall {
            op,
            repo: repo.to_path_buf(),
            detail,
        });
        let mut counts = self.counts.borrow_mut();
        let n = counts.entry(op).or_insert(0);
        *n += 1;
        match self.failures.get(op) {
            Some(&after) if *n > after => Err(ForgeError::Vcs {
                op,
                code: Some(1),
                diagnostic: format!("fake {op} failure"),
            }),
            _ => Ok(()),
        }
    }
}

impl Vcs for FakeVcs {
    fn stage(&self, repo: &Path, paths: &[PathBuf]) -> Result<VcsOutcome> {
        let detail = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        self.record("add", repo, detail)?;
        Ok(VcsOutcome::Applied)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<VcsOutcome> {
        self.record("commit", repo, message.to_string())?;
        if self.clean_tree {
            Ok(VcsOutcome::NothingToCommit)
        } else {
            Ok(VcsOutcome::Applied)
        }
    }

    fn push(&self, repo: &Path, upstream: Option<&Upstream>) -> Result<VcsOutcome> {
        let detail = upstream
            .map(|u| format!("-u {} {}", u.remote, u.branch))
            .unwrap_or_default();
        self.record("push", repo, detail)?;
        if self.up_to_date_push {
            Ok(VcsOutcome::NothingToCommit)
        } else {
            Ok(VcsOutcome::Applied)
        }
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<VcsOutcome> {
        self.record("clone", dest, url.to_string())?;
        std::fs::create_dir_all(dest)?;
        for f in &self.remote_files {
            crate::io::atomic_write(&dest.join(&f.path), f.content.as_bytes())?;
        }
        Ok(VcsOutcome::Applied)
    }

    fn set_identity(&self, repo: &Path, name: &str, email: &str) -> Result<VcsOutcome> {
        self.record("config", repo, format!("{name} <{email}>"))?;
        Ok(VcsOutcome::Applied)
    }

    fn checkout_branch(&self, repo: &Path, branch: &str) -> Result<VcsOutcome> {
        self.record("checkout", repo, branch.to_string())?;
        Ok(VcsOutcome::Applied)
    }
}

// ---------------------------------------------------------------------------
// FakeTransport
// ---------------------------------------------------------------------------

pub struct FakeTransport {
    reply: std::result::Result<String, String>,
    pub requests: RefCell<Vec<ModelRequest>>,
}

impl FakeTransport {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            reply: Err(reason.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn prompt(&self, index: usize) -> String {
        self.requests.borrow()[index]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ModelTransport for FakeTransport {
    fn complete(&self, request: &ModelRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        self.reply.clone().map_err(ForgeError::Transport)
    }
}

// ---------------------------------------------------------------------------
// FakeHost
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeHost {
    fail_status: Option<u16>,
    pub created: RefCell<Vec<NewRepo>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            created: RefCell::new(Vec::new()),
        }
    }
}

impl RepoHost for FakeHost {
    fn create_repo(&self, repo: &NewRepo) -> Result<RemoteRepo> {
        self.created.borrow_mut().push(repo.clone());
        if let Some(status) = self.fail_status {
            return Err(ForgeError::Hosting {
                status,
                body: "rejected".to_string(),
            });
        }
        Ok(RemoteRepo {
            name: repo.name.clone(),
            clone_url: self.clone_url(&repo.name),
        })
    }

    fn clone_url(&self, name: &str) -> String {
        format!("https://git.example/octo/{name}.git")
    }
}

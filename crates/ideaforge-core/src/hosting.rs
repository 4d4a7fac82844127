//! Remote repository hosting.
//!
//! Only one call is needed: create an empty repository for a new project.
//! [`GithubHost`] implements it against the GitHub REST API with the
//! blocking `reqwest` client, since the core runs synchronously.

use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_WEB_BASE: &str = "https://github.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRepo {
    pub name: String,
    pub description: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepo {
    pub name: String,
    pub clone_url: String,
}

pub trait RepoHost {
    fn create_repo(&self, repo: &NewRepo) -> Result<RemoteRepo>;

    /// Clone URL of an existing repository, without credentials.
    fn clone_url(&self, name: &str) -> String;
}

/// Embed a token into an `https://` clone URL so pushes authenticate without
/// a credential helper. Other URLs (local paths in tests) pass through.
pub fn authenticated_url(clone_url: &str, token: &str) -> String {
    match clone_url.strip_prefix("https://") {
        Some(rest) if !token.is_empty() => format!("https://x-access-token:{token}@{rest}"),
        _ => clone_url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GithubHost {
    api_base: String,
    web_base: String,
    owner: String,
    token: String,
    http: reqwest::blocking::Client,
}

impl fmt::Debug for GithubHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubHost")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GithubHost {
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ideaforge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            owner: owner.into(),
            token: token.into(),
            http,
        })
    }

    pub fn with_web_base(mut self, web_base: impl Into<String>) -> Self {
        self.web_base = web_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl RepoHost for GithubHost {
    fn create_repo(&self, repo: &NewRepo) -> Result<RemoteRepo> {
        let url = format!("{}/user/repos", self.api_base);
        tracing::info!(name = %repo.name, private = repo.private, "creating remote repository");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(repo)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ForgeError::Hosting {
                status: status.as_u16(),
                body: body.replace(&self.token, "***"),
            });
        }
        Ok(response.json::<RemoteRepo>()?)
    }

    fn clone_url(&self, name: &str) -> String {
        format!("{}/{}/{}.git", self.web_base, self.owner, name)
    }
}

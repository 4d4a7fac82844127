use crate::error::{ForgeError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_MODEL: &str = "OPENROUTER_MODEL";
pub const ENV_GITHUB_OWNER: &str = "GITHUB_OWNER";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

pub const DEFAULT_MODEL: &str = "google/gemma-3-4b-it:free";

// ---------------------------------------------------------------------------
// Settings (ideaforge.yaml)
// ---------------------------------------------------------------------------

/// Tunables read from `<root>/ideaforge.yaml`. Every field has a default, so
/// a missing file and an empty file are both valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_new_project_probability")]
    pub new_project_probability: f64,
    #[serde(default = "default_context_budget")]
    pub context_budget: usize,
    #[serde(default = "default_context_file_overhead")]
    pub context_file_overhead: usize,
    #[serde(default = "default_fallback_cap")]
    pub fallback_cap: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_new_temperature")]
    pub new_temperature: f32,
    #[serde(default = "default_improve_temperature")]
    pub improve_temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_ideas_dir")]
    pub ideas_dir: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub private_repos: bool,
    #[serde(default = "default_commit_name")]
    pub commit_name: String,
    #[serde(default = "default_commit_email")]
    pub commit_email: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_github_api")]
    pub github_api: String,
    #[serde(default = "default_lock_stale_after_secs")]
    pub lock_stale_after_secs: u64,
}

fn default_new_project_probability() -> f64 {
    3.0 / 8.0
}

fn default_context_budget() -> usize {
    5500
}

fn default_context_file_overhead() -> usize {
    200
}

fn default_fallback_cap() -> usize {
    8000
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_new_temperature() -> f32 {
    0.85
}

fn default_improve_temperature() -> f32 {
    0.8
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_ideas_dir() -> String {
    "ideas".to_string()
}

fn default_manifest_file() -> String {
    "repos.txt".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_commit_name() -> String {
    "ideaforge".to_string()
}

fn default_commit_email() -> String {
    "ideaforge@users.noreply.github.com".to_string()
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_lock_stale_after_secs() -> u64 {
    30 * 60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            new_project_probability: default_new_project_probability(),
            context_budget: default_context_budget(),
            context_file_overhead: default_context_file_overhead(),
            fallback_cap: default_fallback_cap(),
            max_tokens: default_max_tokens(),
            new_temperature: default_new_temperature(),
            improve_temperature: default_improve_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            ideas_dir: default_ideas_dir(),
            manifest_file: default_manifest_file(),
            default_branch: default_branch(),
            private_repos: false,
            commit_name: default_commit_name(),
            commit_email: default_commit_email(),
            api_base: default_api_base(),
            github_api: default_github_api(),
            lock_stale_after_secs: default_lock_stale_after_secs(),
        }
    }
}

impl Settings {
    /// Load `<root>/ideaforge.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        let settings = match std::fs::read_to_string(&path) {
            Ok(data) if data.trim().is_empty() => Settings::default(),
            Ok(data) => serde_yaml::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.new_project_probability) {
            return Err(ForgeError::ConfigInvalid(format!(
                "new_project_probability must be within [0, 1], got {}",
                self.new_project_probability
            )));
        }
        if self.context_budget == 0 {
            return Err(ForgeError::ConfigInvalid(
                "context_budget must be positive".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ForgeError::ConfigInvalid(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.default_branch.trim().is_empty() {
            return Err(ForgeError::ConfigInvalid(
                "default_branch must not be empty".into(),
            ));
        }
        if self.ideas_dir.trim().is_empty() || self.manifest_file.trim().is_empty() {
            return Err(ForgeError::ConfigInvalid(
                "ideas_dir and manifest_file must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Trimmed value of `key`, treating unset and blank alike.
fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Account used to create and push remote repositories.
#[derive(Clone, PartialEq, Eq)]
pub struct HostingAccount {
    pub owner: String,
    pub token: String,
}

impl fmt::Debug for HostingAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostingAccount")
            .field("owner", &self.owner)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Every project is a directory inside the primary repository.
    SingleRepo,
    /// Every project is its own remote repository, tracked by the manifest.
    MultiRepo(HostingAccount),
}

impl Mode {
    /// Multi-repo when both `GITHUB_OWNER` and `GITHUB_TOKEN` are set and
    /// non-empty, single-repo otherwise.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let owner = non_empty(&lookup, ENV_GITHUB_OWNER);
        let token = non_empty(&lookup, ENV_GITHUB_TOKEN);
        match (owner, token) {
            (Some(owner), Some(token)) => Mode::MultiRepo(HostingAccount { owner, token }),
            _ => Mode::SingleRepo,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::SingleRepo => "single-repo",
            Mode::MultiRepo(_) => "multi-repo",
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything a run needs, resolved once at startup and passed down.
#[derive(Clone)]
pub struct Config {
    pub root: PathBuf,
    pub api_key: String,
    pub model: String,
    pub mode: Mode,
    pub settings: Settings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("root", &self.root)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("mode", &self.mode)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Config {
    /// Resolve configuration from the process environment and the settings file.
    pub fn from_env(root: &Path) -> Result<Self> {
        Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an injectable variable lookup.
    pub fn from_lookup<F>(root: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {

        let api_key =
            non_empty(&lookup, ENV_API_KEY).ok_or(ForgeError::MissingEnv(ENV_API_KEY))?;
        let model = non_empty(&lookup, ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let mode = Mode::from_lookup(&lookup);
        let settings = Settings::load(root)?;

        Ok(Self {
            root: root.to_path_buf(),
            api_key,
            model,
            mode,
            settings,
        })
    }

    pub fn ideas_dir(&self) -> PathBuf {
        paths::ideas_dir(&self.root, &self.settings.ideas_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        paths::manifest_path(&self.root, &self.settings.manifest_file)
    }
}

use crate::error::{ForgeError, Result};
use chrono::{DateTime, TimeZone};
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const SETTINGS_FILE: &str = "ideaforge.yaml";
pub const LOCK_FILE: &str = ".ideaforge.lock";
pub const ENV_FILE: &str = ".env";
pub const GIT_DIR: &str = ".git";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

pub fn env_path(root: &Path) -> PathBuf {
    root.join(ENV_FILE)
}

pub fn ideas_dir(root: &Path, ideas_dir: &str) -> PathBuf {
    root.join(ideas_dir)
}

pub fn project_dir(root: &Path, ideas_dir: &str, name: &str) -> PathBuf {
    root.join(ideas_dir).join(name)
}

pub fn manifest_path(root: &Path, manifest_file: &str) -> PathBuf {
    root.join(manifest_file)
}

/// True for a path segment naming version-control metadata, in any case.
pub fn is_git_dir(segment: &str) -> bool {
    segment.eq_ignore_ascii_case(GIT_DIR)
}

/// Join a model-supplied relative path onto `base`, refusing anything that
/// could land outside it or inside the repository's `.git` directory.
pub fn contained_join(base: &Path, rel: &str) -> Result<PathBuf> {
    let rel_path = Path::new(rel);
    if rel.is_empty() {
        return Err(ForgeError::UnsafePath(rel.to_string()));
    }
    for component in rel_path.components() {
        match component {
            Component::Normal(seg) if seg.to_str().is_some_and(is_git_dir) => {
                return Err(ForgeError::UnsafePath(rel.to_string()));
            }
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(ForgeError::UnsafePath(rel.to_string())),
        }
    }
    Ok(base.join(rel_path))
}

// ---------------------------------------------------------------------------
// Project naming
// ---------------------------------------------------------------------------

/// Directory slug for a project created at `now`, e.g. `2026-10-16_0930`.
pub fn project_slug<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y-%m-%d_%H%M").to_string()
}

/// Remote repository name for a project created at `now`, e.g.
/// `idea-20261016-093012-k3x9`. The suffix keeps two runs in the same second
/// from colliding on the hosting side.
pub fn repo_name<Tz: TimeZone, R: Rng + ?Sized>(now: &DateTime<Tz>, rng: &mut R) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("idea-{}-{suffix}", now.format("%Y%m%d-%H%M%S"))
}

/// Name of the single file written when a new-project response has no markers.
pub fn fallback_file_name(slug: &str) -> String {
    format!("main_{}.txt", slug.replace('-', "").replace(' ', "_"))
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").unwrap())
}

/// Project and repository names become directory names and URL segments.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 100 || !name_re().is_match(name) || name.contains("..") {
        return Err(ForgeError::ConfigInvalid(format!(
            "invalid project name '{name}'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

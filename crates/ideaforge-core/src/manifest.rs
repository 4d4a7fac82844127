//! Known projects: the local ideas directory and the multi-repo manifest.

use crate::config::{Config, Mode};
use crate::error::Result;
use crate::io;
use std::path::Path;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Read repository names from the manifest, in append order.
///
/// Blank lines and `#` comments are skipped. A missing file is an empty
/// manifest.
pub fn load(path: &Path) -> Result<Vec<String>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Append one repository name. Only called after the repository was pushed.
pub fn append(path: &Path, name: &str) -> Result<()> {
    io::append_line(path, name)
}

// ---------------------------------------------------------------------------
// Local projects
// ---------------------------------------------------------------------------

/// Project directories under `ideas_dir`, sorted by name. Hidden entries are
/// ignored.
pub fn local_projects(ideas_dir: &Path) -> Result<Vec<String>> {
    if !ideas_dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(ideas_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// The full set of improve candidates for the configured mode.
pub fn known_projects(config: &Config) -> Result<Vec<String>> {
    match config.mode {
        Mode::SingleRepo => local_projects(&config.ideas_dir()),
        Mode::MultiRepo(_) => load(&config.manifest_path()),
    }
}

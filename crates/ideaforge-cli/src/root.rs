use std::path::{Path, PathBuf};

/// Resolve the primary repository root.
///
/// Priority:
/// 1. `--root` flag / `IDEAFORGE_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `start` looking for `ideaforge.yaml`
/// 3. Walk upward from `start` looking for `.git/`
/// 4. Fall back to `start`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_root(&cwd)
}

pub fn discover_root(start: &Path) -> PathBuf {
    let settings = ideaforge_core::paths::SETTINGS_FILE;
    let git = ideaforge_core::paths::GIT_DIR;
    find_upward(start, |dir| dir.join(settings).is_file())
        .or_else(|| find_upward(start, |dir| dir.join(git).exists()))
        .unwrap_or_else(|| start.to_path_buf())
}

fn find_upward(start: &Path, hit: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|d| hit(d)).map(Path::to_path_buf)
}

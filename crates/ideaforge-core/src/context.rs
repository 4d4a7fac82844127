//! Serializes a project's files into one bounded text blob for the improve prompt.

use crate::paths::GIT_DIR;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const TRUNCATION_MARKER: &str = "\n... (truncated)";
pub const EMPTY_SENTINEL: &str = "(no files)";
const PART_SEPARATOR: &str = "\n\n";

/// Budget parameters for [`build_context`]. Lengths are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    /// Hard upper bound on the blob, excluding one truncation marker.
    pub max_chars: usize,
    /// Minimum charge per file for its header and separator.
    pub per_file_overhead: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: 5500,
            per_file_overhead: 200,
        }
    }
}

/// Relative paths of every regular file under `dir`, `/`-separated and
/// sorted lexicographically. `.git` is skipped and symlinks are not followed.
pub fn list_files(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut files: Vec<(String, PathBuf)> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != GIT_DIR)
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(dir).ok()?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some((rel, e.into_path()))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

/// Build the context blob for the project rooted at `dir`.
///
/// Each file becomes `--- <path> ---\n<content>`; parts are separated by a
/// blank line. The file that would overflow the budget is cut to fit, gets
/// [`TRUNCATION_MARKER`], and ends the traversal. Output is deterministic for
/// an unchanged tree and never empty.
pub fn build_context(dir: &Path, budget: ContextBudget) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut used = 0usize;

    for (rel, path) in list_files(dir) {
        let text = match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::debug!(path = %rel, error = %e, "skipping unreadable file");
                continue;
            }
        };

        let header = format!("--- {rel} ---\n");
        let separator = if parts.is_empty() { 0 } else { PART_SEPARATOR.len() };
        let cost = budget
            .per_file_overhead
            .max(header.chars().count() + separator);
        let len = text.chars().count();

        if used + cost + len <= budget.max_chars {
            parts.push(format!("{header}{text}"));
            used += cost + len;
            if used >= budget.max_chars {
                break;
            }
            continue;
        }

        let remaining = budget.max_chars.saturating_sub(used);
        if remaining < cost {
            if parts.is_empty() {
                parts.push(TRUNCATION_MARKER.trim_start().to_string());
            }
            break;
        }
        let kept: String = text.chars().take(remaining - cost).collect();
        parts.push(format!("{header}{kept}{TRUNCATION_MARKER}"));
        break;
    }

    if parts.is_empty() {
        return EMPTY_SENTINEL.to_string();
    }
    parts.join(PART_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let p = dir.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, content).unwrap();
    }

    fn budget(max_chars: usize) -> ContextBudget {
        ContextBudget {
            max_chars,
            per_file_overhead: 200,
        }
    }

    #[test]
    fn files_in_lexicographic_path_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "B");
        write(dir.path(), "a/z.txt", "AZ");
        write(dir.path(), "a.txt", "A");
        let blob = build_context(dir.path(), ContextBudget::default());
        assert_eq!(
            blob,
            "--- a.txt ---\nA\n\n--- a/z.txt ---\nAZ\n\n--- b.txt ---\nB"
        );
    }

    #[test]
    fn git_metadata_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".git/config", "[core]");
        write(dir.path(), "main.py", "print(1)");
        let blob = build_context(dir.path(), ContextBudget::default());
        assert!(!blob.contains("[core]"));
        assert!(blob.contains("--- main.py ---"));
    }

    #[test]
    fn output_is_deterministic() {
        let dir = TempDir::new().unwrap();
        for i in 0..20 {
            write(dir.path(), &format!("src/m{i}.js"), &"x".repeat(i * 37));
        }
        let first = build_context(dir.path(), budget(3000));
        let second = build_context(dir.path(), budget(3000));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_tree_yields_sentinel() {
        let dir = TempDir::new().unwrap();
        assert_eq!(build_context(dir.path(), budget(100)), EMPTY_SENTINEL);
    }

    #[test]
    fn overflowing_file_is_truncated_and_stops_traversal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", &"a".repeat(100));
        write(dir.path(), "b.txt", &"b".repeat(1000));
        write(dir.path(), "c.txt", "never included");

        let blob = build_context(dir.path(), budget(600));
        assert!(blob.contains("--- a.txt ---"));
        assert!(blob.contains("--- b.txt ---"));
        assert!(blob.ends_with(TRUNCATION_MARKER));
        assert!(!blob.contains("c.txt"));

        // a costs 200 + 100, b gets the remaining 300 - 200 characters.
        let b_part = blob.split("--- b.txt ---\n").nth(1).unwrap();
        assert_eq!(b_part, format!("{}{TRUNCATION_MARKER}", "b".repeat(100)));
    }

    #[test]
    fn blob_respects_budget_plus_one_marker() {
        let dir = TempDir::new().unwrap();
        for i in 0..30 {
            write(
                dir.path(),
                &format!("dir{}/file_with_a_longer_name_{i}.txt", i % 4),
                &"é".repeat(50 + i * 13),
            );
        }
        for max in [1, 50, 199, 200, 201, 450, 1000, 2500, 5500] {
            let blob = build_context(dir.path(), budget(max));
            assert!(!blob.is_empty());
            assert!(
                blob.chars().count() <= max + TRUNCATION_MARKER.chars().count(),
                "budget {max}: got {}",
                blob.chars().count()
            );
        }
    }

    #[test]
    fn long_paths_are_charged_their_real_header_cost() {
        let dir = TempDir::new().unwrap();
        let segment = "d".repeat(100);
        let long = format!("{segment}/{segment}/{segment}/x.txt");
        write(dir.path(), &long, &"x".repeat(100));
        let blob = build_context(dir.path(), budget(350));
        assert!(blob.chars().count() <= 350 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn file_exactly_at_budget_is_not_truncated() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", &"a".repeat(300));
        write(dir.path(), "b.txt", "b");
        let blob = build_context(dir.path(), budget(500));
        assert!(!blob.contains("truncated"));
        assert!(!blob.contains("b.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(outside.path(), "secret.txt", "secret");
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        write(dir.path(), "real.txt", "real");
        let blob = build_context(dir.path(), budget(1000));
        assert!(!blob.contains("secret"));
        assert!(blob.contains("real"));
    }
}

//! Extracts files from a free-text model completion.
//!
//! The model is asked to answer in the marker format:
//!
//! ```text
//! ---FILE: src/main.py---
//! print("hello")
//! ---END---
//! ```
//!
//! A body runs until the next `---FILE:` token, an `---END---` token, or the
//! end of the input, whichever comes first. Anything between an `---END---`
//! and the next header is ignored, so chatter around the files is harmless.

use crate::paths;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const FILE_TOKEN: &str = "---FILE:";
pub const END_TOKEN: &str = "---END---";

const DOC_EXTENSIONS: &[&str] = &["md", "markdown"];

/// One file extracted from a response, path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

static HEADER_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    HEADER_RE.get_or_init(|| {
        Regex::new(r"---FILE:[ \t]*([^\r\n]*?)[ \t]*---[ \t]*\r?\n").unwrap()
    })
}

/// Parse `text` into files in the order their headers appear.
///
/// Returns an empty list when no header is recognized; callers decide
/// whether that is recoverable.
pub fn parse(text: &str) -> Vec<ProjectFile> {
    let mut files = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(caps) = header_re().captures(&text[pos..]) else {
            break;
        };
        let (Some(whole), Some(raw_path)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let raw_path = raw_path.as_str();
        let body_start = pos + whole.end();

        let rest = &text[body_start..];
        let body_len = [rest.find(FILE_TOKEN), rest.find(END_TOKEN)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());
        let body = rest[..body_len].trim_end();
        pos = body_start + body_len;

        let Some(path) = normalize_path(raw_path) else {
            continue;
        };
        if body.is_empty() && !is_documentation(&path) {
            tracing::debug!(path = %path, "skipping empty non-documentation file");
            continue;
        }
        files.push(ProjectFile {
            path,
            content: body.to_string(),
        });
    }

    files
}

/// Parse raw bytes, replacing invalid UTF-8 sequences.
pub fn parse_bytes(bytes: &[u8]) -> Vec<ProjectFile> {
    parse(&String::from_utf8_lossy(bytes))
}

/// Serialize files back into the marker format.
pub fn render(files: &[ProjectFile]) -> String {
    let mut out = String::new();
    for f in files {
        out.push_str(FILE_TOKEN);
        out.push(' ');
        out.push_str(&f.path);
        out.push_str("---\n");
        out.push_str(&f.content);
        out.push('\n');
        out.push_str(END_TOKEN);
        out.push('\n');
    }
    out
}

/// Canonical relative form of a model-supplied path, or `None` if it is
/// empty, climbs out of the project or points into `.git`.
pub fn normalize_path(raw: &str) -> Option<String> {
    let path = raw.trim().replace('\\', "/");
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    if path.split('/').any(|seg| seg == "..") {
        tracing::warn!(path = %path, "dropping file with parent-directory component");
        return None;
    }
    if path.split('/').any(paths::is_git_dir) {
        tracing::warn!(path = %path, "dropping file inside version-control metadata");
        return None;
    }
    Some(path.to_string())
}

/// Documentation files may legitimately be empty.
pub fn is_documentation(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DOC_EXTENSIONS.iter().any(|d| d.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pf(path: &str, content: &str) -> ProjectFile {
        ProjectFile::new(path, content)
    }

    #[test]
    fn parses_files_in_order() {
        let text = "---FILE: main.py---\nprint('hi')\n---END---\n\
                    ---FILE: README.md---\n# Tool\n---END---\n";
        assert_eq!(
            parse(text),
            vec![pf("main.py", "print('hi')"), pf("README.md", "# Tool")]
        );
    }

    #[test]
    fn round_trips_rendered_files() {
        let files = vec![
            pf("cli/app.go", "package main\n\nfunc main() {}"),
            pf("web/index.html", "<html>\n  <body></body>\n</html>"),
            pf("docs/NOTES.md", ""),
            pf("script.sh", "    indented first line\necho ok"),
        ];
        assert_eq!(parse(&render(&files)), files);
    }

    #[test]
    fn random_file_sets_round_trip() {
        const PATH_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789_";
        const BODY_CHARS: &[char] = &[
            'a', 'z', 'Q', '0', '9', ' ', '\t', '\n', '{', '}', '(', ')', ';', '#', '=', '"',
            '/', '\\', '.', 'é', '✓',
        ];
        const EXTENSIONS: &[&str] = &["", ".rs", ".py", ".txt", ".md"];

        let mut rng = StdRng::seed_from_u64(0xD0C5);
        for _ in 0..300 {
            let files: Vec<ProjectFile> = (0..rng.gen_range(0..6))
                .map(|_| {
                    let segments: Vec<String> = (0..rng.gen_range(1..4))
                        .map(|_| {
                            (0..rng.gen_range(1..8))
                                .map(|_| PATH_CHARS[rng.gen_range(0..PATH_CHARS.len())] as char)
                                .collect()
                        })
                        .collect();
                    let ext = EXTENSIONS[rng.gen_range(0..EXTENSIONS.len())];
                    let path = format!("{}{ext}", segments.join("/"));

                    let mut content: String = (0..rng.gen_range(0..60))
                        .map(|_| BODY_CHARS[rng.gen_range(0..BODY_CHARS.len())])
                        .collect();
                    // Bodies come back with trailing whitespace trimmed; only
                    // documentation may be empty.
                    content.truncate(content.trim_end().len());
                    if content.is_empty() && (!is_documentation(&path) || rng.gen_bool(0.5)) {
                        content.push('x');
                    }
                    ProjectFile::new(path, content)
                })
                .collect();

            assert_eq!(parse(&render(&files)), files);
        }
    }

    #[test]
    fn zero_markers_is_a_miss() {
        assert!(parse("Sure! Here is an idea: a todo app.").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn leading_separators_are_stripped() {
        let files = parse("---FILE: /etc/passwd---\nroot\n---END---");
        assert_eq!(files, vec![pf("etc/passwd", "root")]);

        let files = parse("---FILE: //abs/x.txt---\nx\n");
        assert_eq!(files[0].path, "abs/x.txt");
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        let files = parse("---FILE: \\src\\lib\\util.py---\npass\n");
        assert_eq!(files, vec![pf("src/lib/util.py", "pass")]);
    }

    #[test]
    fn parent_escapes_are_dropped() {
        let files = parse(
            "---FILE: ../outside.txt---\nbad\n---END---\n---FILE: ok.txt---\ngood\n---END---",
        );
        assert_eq!(files, vec![pf("ok.txt", "good")]);
    }

    #[test]
    fn git_metadata_paths_are_dropped() {
        let files = parse(
            "---FILE: .git/config---\n[core]\n\tfsmonitor = \"touch pwned\"\n---END---\n\
             ---FILE: sub/.GIT/hooks/pre-commit---\nexit 0\n---END---\n\
             ---FILE: .gitignore---\ntarget/\n---END---\n\
             ---FILE: a.txt---\nok\n---END---",
        );
        assert_eq!(files, vec![pf(".gitignore", "target/"), pf("a.txt", "ok")]);
    }

    #[test]
    fn trailing_whitespace_trimmed_leading_kept() {
        let files = parse("---FILE: a.py---\n    x = 1\n\n\n   \n---END---");
        assert_eq!(files, vec![pf("a.py", "    x = 1")]);
    }

    #[test]
    fn missing_terminator_runs_to_end_of_input() {
        let files = parse("---FILE: a.txt---\nline one\nline two");
        assert_eq!(files, vec![pf("a.txt", "line one\nline two")]);
    }

    #[test]
    fn next_header_terminates_body_without_end_marker() {
        let files = parse("---FILE: a.txt---\nA\n---FILE: b.txt---\nB\n");
        assert_eq!(files, vec![pf("a.txt", "A"), pf("b.txt", "B")]);
    }

    #[test]
    fn empty_body_only_kept_for_documentation() {
        let text = "---FILE: empty.py---\n---END---\n---FILE: CHANGES.MD---\n---END---\n";
        assert_eq!(parse(text), vec![pf("CHANGES.MD", "")]);
    }

    #[test]
    fn empty_path_is_skipped() {
        let files = parse("---FILE: ---\ncontent\n---END---\n---FILE: b.txt---\nb\n");
        assert_eq!(files, vec![pf("b.txt", "b")]);
    }

    #[test]
    fn duplicate_paths_are_all_emitted_in_order() {
        let files = parse("---FILE: a.txt---\nv1\n---END---\n---FILE: a.txt---\nv2\n---END---");
        assert_eq!(files, vec![pf("a.txt", "v1"), pf("a.txt", "v2")]);
    }

    #[test]
    fn nested_header_inside_body_splits_the_body() {
        // Marker text inside a body cannot be escaped; the body ends there.
        let text = "---FILE: doc.md---\nUse ---FILE: x--- to start\n---END---";
        let files = parse(text);
        assert_eq!(files, vec![pf("doc.md", "Use")]);
    }

    #[test]
    fn end_marker_inside_body_truncates_it() {
        let files = parse("---FILE: a.txt---\nbefore ---END--- after\n");
        assert_eq!(files, vec![pf("a.txt", "before")]);
    }

    #[test]
    fn header_without_closing_dashes_is_not_a_marker() {
        assert!(parse("---FILE: a.txt\ncontent\n").is_empty());
    }

    #[test]
    fn crlf_headers_are_accepted() {
        let files = parse("---FILE: a.txt---\r\nhello\r\n---END---\r\n");
        assert_eq!(files, vec![pf("a.txt", "hello")]);
    }

    #[test]
    fn commentary_between_files_is_ignored() {
        let text = "Here you go:\n---FILE: a.txt---\nA\n---END---\n\
                    And another:\n---FILE: b.txt---\nB\n---END---\nEnjoy!";
        assert_eq!(parse(text), vec![pf("a.txt", "A"), pf("b.txt", "B")]);
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let mut bytes = b"---FILE: bin.txt---\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'o', b'k']);
        bytes.extend_from_slice(b"\n---END---\n");
        let files = parse_bytes(&bytes);
        assert_eq!(files.len(), 1);
        assert!(files[0].content.ends_with("ok"));
    }

    #[test]
    fn multibyte_text_near_markers() {
        let files = parse("---FILE: ü/ß.txt---\nсодержимое ✓\n---END---");
        assert_eq!(files, vec![pf("ü/ß.txt", "содержимое ✓")]);
    }

    #[test]
    fn random_garbage_never_panics() {
        let alphabet: Vec<&str> = vec![
            "---FILE:", "---END---", "---", "\n", "\r\n", " ", "/", "\\", "..", "a", "b.md",
            "é", "\t", "-", "FILE", ":", ".git",
        ];
        let mut rng = StdRng::seed_from_u64(0xF11E);
        for _ in 0..2_000 {
            let len = rng.gen_range(0..40);
            let text: String = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            for f in parse(&text) {
                assert!(!f.path.is_empty());
                assert!(!f.path.starts_with('/'));
                assert!(!f.path.split('/').any(|s| s == ".." || paths::is_git_dir(s)));
                assert_eq!(f.content, f.content.trim_end());
                assert!(!f.content.is_empty() || is_documentation(&f.path));
            }
        }
    }

    #[test]
    fn random_bytes_never_panic() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let len = rng.gen_range(0..256);
            let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let _ = parse_bytes(&bytes);
        }
    }

    #[test]
    fn documentation_extension_check() {
        assert!(is_documentation("README.md"));
        assert!(is_documentation("docs/guide.Markdown"));
        assert!(!is_documentation("main.rs"));
        assert!(!is_documentation("md"));
    }
}

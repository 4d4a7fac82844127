use crate::error::Result;
use crate::io;
use crate::parser::ProjectFile;
use crate::paths;
use std::path::Path;

/// Write every file under `dir` in input order, creating directories as
/// needed. Existing files are overwritten; there is no merge and no
/// atomicity across files. Every path is checked before anything is
/// written. Returns the number of files written.
pub fn apply(dir: &Path, files: &[ProjectFile]) -> Result<usize> {
    let targets = files
        .iter()
        .map(|f| paths::contained_join(dir, &f.path))
        .collect::<Result<Vec<_>>>()?;
    io::ensure_dir(dir)?;
    for (file, target) in files.iter().zip(&targets) {
        let content = io::normalize_newlines(&file.content);
        io::atomic_write(target, content.as_bytes())?;
        tracing::debug!(path = %file.path, bytes = content.len(), "wrote file");
    }
    Ok(files.len())
}

pub mod root;
pub mod transport;

/// Load `<root>/.env` into the process environment. Variables already set
/// win; a missing file is not an error.
pub fn load_env_file(root: &std::path::Path) {
    let path = ideaforge_core::paths::env_path(root);
    if path.is_file() {
        if let Err(e) = dotenvy::from_path(&path) {
            tracing::warn!(path = %path.display(), error = %e, "could not read .env file");
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("model transport failed: {0}")]
    Transport(String),

    #[error("model response for '{0}' contained no files")]
    ParseMiss(String),

    #[error("git {op} failed{}: {diagnostic}", exit_suffix(.code))]
    Vcs {
        op: &'static str,
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("git executable not found on PATH")]
    VcsUnavailable,

    #[error("repository host returned {status}: {body}")]
    Hosting { status: u16, body: String },

    #[error("unsafe file path '{0}': must stay inside the project directory")]
    UnsafePath(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("another run holds the lock at {0}")]
    Busy(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (exit {c})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ForgeError>;

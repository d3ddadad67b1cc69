use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, AlignError>;

/// Fatal errors. Unreadable source files and unresolved imports are not
/// errors; they are logged and skipped where they occur.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AlignError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AlignError::Io {
            path: path.into(),
            source,
        }
    }
}

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open store {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: heed::Error,
    },

    #[error("Empty store: {0}")]
    EmptyStore(String),

    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, VizError>;

impl VizError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: heed::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }
}

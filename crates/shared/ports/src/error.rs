use thiserror::Error;

/// Storage-level failures. These are fatal for the command that hit them.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt store: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job `{0}` already exists")]
    DuplicateJob(String),

    #[error("job `{0}` not found")]
    JobNotFound(String),

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Other(String),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("indexer error: unavailable: {0}")]
    Unavailable(String),

    #[error("indexer error: unable to read snapshot {path}: {source}")]
    SnapshotIo { path: String, source: std::io::Error },

    #[error("indexer error: malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type IndexResult<T> = Result<T, IndexError>;

use thiserror::Error;

/// Shared error type for every crate in the workspace.
///
/// None of these ever propagate out of the public search/ingest API as a
/// hard failure: each call site either recovers (fallback query, empty
/// token stream, index recreation) or downgrades the error into an empty
/// result, logging the cause along the way.
#[derive(Error, Debug)]
pub enum Error {
    #[error("empty query")]
    EmptyQuery,

    #[error("unknown prefecture: {0}")]
    UnknownPrefecture(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("failed to parse query: {0}")]
    Parse(String),

    #[error("failed to acquire index writer")]
    WriterUnavailable,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("index directory is corrupt, recreating: {0}")]
    CorruptIndex(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(String),
}

pub type Result<T> = std::result::Result<T, Error>;

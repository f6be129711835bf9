use std::path::PathBuf;

use crate::db::DbError;
use crate::ingest::pipeline::Stage;
use crate::ingest::reader::ParseError;

/// Error types for ingesting a single station file
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage failed: {0}")]
    Storage(#[from] DbError),

    #[error("Cannot derive station id from file name: {0}")]
    InvalidFileName(String),

    #[error("Background parse task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A file that did not make it to `Done`, with the stage it failed in
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: Stage,
    pub error: IngestError,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed during {}: {}",
            self.path.display(),
            self.stage,
            self.error
        )
    }
}

impl std::error::Error for FileFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

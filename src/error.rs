use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the processor.
///
/// `Configuration`, `NotFound` and `Io` are fatal and abort a run before any
/// file is processed. `PerFile` is recovered inside the batch loop and only
/// ever appears in a [`crate::FileReport`].
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("input directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to process {}: {reason}", path.display())]
    PerFile { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessorError {
    /// True for errors that must stop the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProcessorError::PerFile { .. })
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a run. A partially written output file is left on disk.
#[derive(Debug, Error)]
pub enum CatsError {
    #[error("cannot create output file {}: {source}", path.display())]
    OutputCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot list directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single candidate file that could not be opened or read as text.
///
/// Never fatal: its `Display` form is embedded in the output in place of the
/// file's contents.
#[derive(Debug, Error)]
#[error("{name} - {source}")]
pub struct FileReadError {
    pub name: String,
    #[source]
    pub source: io::Error,
}

pub type Result<T> = std::result::Result<T, CatsError>;

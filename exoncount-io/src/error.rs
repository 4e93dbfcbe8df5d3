use std::io;
use std::path::PathBuf;

use exoncount_core::GeneModelError;
use thiserror::Error;

/// Error type for exoncount-io operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File extension is not one of the supported alignment formats.
    #[error("Unsupported alignment format: {0:?}")]
    UnsupportedFormat(PathBuf),

    /// The alignment header could not be read.
    #[error("Failed to read alignment header of {path:?}: {source}")]
    Header { path: PathBuf, source: io::Error },

    /// A record could not be decoded.
    #[error("Malformed alignment record #{record}: {message}")]
    Alignment { record: u64, message: String },

    /// Two-character SAM tag expected.
    #[error("Invalid SAM tag: {0:?}")]
    InvalidTag(String),

    /// A GTF line could not be parsed.
    #[error("GTF parse error at line {line}: {message}")]
    Gtf { line: usize, message: String },

    /// A lookup table line could not be parsed.
    #[error("Table parse error in {path:?} at line {line}: {message}")]
    Table {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    GeneModel(#[from] GeneModelError),
}

/// Result type alias for exoncount-io operations.
pub type Result<T> = std::result::Result<T, IoError>;

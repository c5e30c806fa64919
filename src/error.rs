//! Error types for fact extraction.

use std::path::PathBuf;
use thiserror::Error;

use crate::syntax::SyntaxError;

/// Input-acquisition failures. Extraction of one file either succeeds with a
/// complete fact record or fails with one of these; there is no partial
/// result.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no parser registered for {}", path.display())]
    UnsupportedInput { path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    #[error("parser failed on {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl ExtractError {
    /// The file the error is about.
    pub fn path(&self) -> &PathBuf {
        match self {
            ExtractError::Io { path, .. }
            | ExtractError::UnsupportedInput { path }
            | ExtractError::Syntax { path, .. }
            | ExtractError::Parse { path, .. } => path,
        }
    }
}
